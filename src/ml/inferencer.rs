// ============================================================
// Layer 5 — Inferencer
// ============================================================
// Reconstructs the full test image from its tiles:
//
//   tiles (row-major, nx × ny)  → model.forward in chunks
//       │
//       ▼
//   merge: tile idx → row idx / nx, column idx % nx,
//          pixel offset (row·label_size, col·label_size)
//       │
//       ▼
//   crop to (lr_h·scale, lr_w·scale) → PNG
//
// The HR tiles go through the same merge, which gives the
// reference the PSNR is measured against.

use anyhow::{anyhow, Result};
use burn::prelude::*;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::data::batcher::PatchBatcher;
use crate::domain::{config::Settings, image::ImagePlane, patch::TestTiles};
use crate::infra::image_store::{save_png, TEST_IMAGE_NAME};
use crate::ml::architecture::SuperResolution;

/// Tiles per forward pass.
const PREDICT_CHUNK: usize = 64;

pub struct Reconstruction {
    pub image: ImagePlane,
    pub path:  PathBuf,
    /// Against the ground-truth HR image, in dB.
    pub psnr:  Option<f64>,
}

/// Run the model over every input tile, preserving order.
pub fn predict_tiles<B: Backend, M: SuperResolution<B>>(
    model:   &M,
    tiles:   &TestTiles,
    batcher: &PatchBatcher<B>,
    size:    usize,
) -> Result<Vec<Vec<f32>>> {
    let mut out = Vec::with_capacity(tiles.len());
    for chunk in tiles.inputs.chunks(PREDICT_CHUNK) {
        let inputs     = batcher.stack(chunk.iter().map(Vec::as_slice), size);
        let prediction = model.forward(inputs);
        let [n, _, _, _] = prediction.dims();

        let values = prediction
            .into_data()
            .convert::<f32>()
            .to_vec::<f32>()
            .map_err(|e| anyhow!("Cannot read prediction tensor: {e:?}"))?;
        out.extend(values.chunks(values.len() / n).map(<[f32]>::to_vec));
    }
    Ok(out)
}

/// Place square CHW tiles row-major and crop to the target extent.
pub fn merge(
    tiles:      &[Vec<f32>],
    layout:     &TestTiles,
    channels:   usize,
    label_size: usize,
) -> ImagePlane {
    let mut canvas = ImagePlane::zeros(
        channels,
        layout.ny * label_size,
        layout.nx * label_size,
    );
    for (idx, tile) in tiles.iter().enumerate() {
        let row = idx / layout.nx;
        let col = idx % layout.nx;
        canvas.paste(tile, row * label_size, col * label_size, label_size);
    }
    canvas.crop_to(layout.target_height, layout.target_width)
}

/// Peak signal-to-noise ratio for samples in [0, 1].
pub fn psnr(prediction: &ImagePlane, reference: &ImagePlane) -> Option<f64> {
    if prediction.data.len() != reference.data.len() || prediction.data.is_empty() {
        return None;
    }
    let mse = prediction
        .data
        .iter()
        .zip(&reference.data)
        .map(|(p, r)| {
            let d = p.clamp(0.0, 1.0) as f64 - *r as f64;
            d * d
        })
        .sum::<f64>()
        / prediction.data.len() as f64;
    (mse > 0.0).then(|| 10.0 * (1.0 / mse).log10())
}

pub struct Inferencer<'a> {
    settings: &'a Settings,
}

impl<'a> Inferencer<'a> {
    pub fn new(settings: &'a Settings) -> Self {
        Self { settings }
    }

    /// Reconstruct `tiles` and write `<output_dir>/test_image.png`.
    pub fn run<B: Backend, M: SuperResolution<B>>(
        &self,
        model:  &M,
        tiles:  &TestTiles,
        device: &B::Device,
    ) -> Result<Reconstruction> {
        let cfg = &self.settings.config;
        let g   = self.settings.geometry;
        let batcher = PatchBatcher::<B>::new(device.clone(), cfg.c_dim, g.image_size, g.label_size);

        tracing::info!("Testing on {} tiles ({} × {})", tiles.len(), tiles.nx, tiles.ny);
        let start       = Instant::now();
        let predictions = predict_tiles(model, tiles, &batcher, g.image_size)?;
        tracing::info!("Took {:.3} seconds", start.elapsed().as_secs_f64());

        let image     = merge(&predictions, tiles, cfg.c_dim, g.label_size);
        let reference = merge(&tiles.labels, tiles, cfg.c_dim, g.label_size);
        let psnr      = psnr(&image, &reference);
        if let Some(db) = psnr {
            tracing::info!("PSNR against the HR image: {:.2} dB", db);
        }

        let path = Path::new(&cfg.output_dir).join(TEST_IMAGE_NAME);
        save_png(&image, &path)?;

        Ok(Reconstruction { image, path, psnr })
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    use crate::data::pipeline::tiles_for;
    use crate::data::preprocessor::Preprocessor;
    use crate::domain::config::{Mode, SrConfig};
    use crate::ml::fsrcnn::Fsrcnn;

    type TestBackend = NdArray;

    fn texture(channels: usize, height: usize, width: usize) -> ImagePlane {
        let n = channels * height * width;
        let data = (0..n).map(|i| ((i * 37) % 101) as f32 / 100.0).collect();
        ImagePlane::new(channels, height, width, data)
    }

    #[test]
    fn test_merge_of_label_tiles_restores_image() {
        for (scale, radius, channels) in [(2, 1, 1), (3, 2, 3), (4, 1, 1)] {
            let settings = SrConfig { scale, radius, c_dim: channels, ..SrConfig::default() }
                .validate()
                .unwrap();
            let plane = texture(channels, 53, 38);
            let tiles = tiles_for(&settings, &plane).unwrap();

            let merged = merge(&tiles.labels, &tiles, channels, settings.geometry.label_size);
            let hr     = Preprocessor::new(scale).modcrop(&plane);
            assert_eq!(merged, hr, "scale {scale}");
        }
    }

    #[test]
    fn test_merge_places_tiles_row_major() {
        let layout = TestTiles {
            inputs:        vec![],
            labels:        vec![],
            nx:            3,
            ny:            2,
            target_height: 4,
            target_width:  5,
        };
        let tiles: Vec<Vec<f32>> = (0..6).map(|i| vec![i as f32; 4]).collect();
        let merged = merge(&tiles, &layout, 1, 2);

        assert_eq!((merged.height, merged.width), (4, 5));
        assert_eq!(merged.get(0, 0, 4), 2.0);
        assert_eq!(merged.get(0, 2, 0), 3.0);
        assert_eq!(merged.get(0, 3, 3), 4.0);
    }

    #[test]
    fn test_psnr() {
        let a = ImagePlane::new(1, 1, 2, vec![0.5, 0.5]);
        let b = ImagePlane::new(1, 1, 2, vec![0.6, 0.4]);
        // mse = 0.01 → 20 dB
        assert!((psnr(&a, &b).unwrap() - 20.0).abs() < 1e-4);
        assert_eq!(psnr(&a, &a), None);
    }

    #[test]
    fn test_run_writes_full_size_image() {
        let tmp = tempfile::tempdir().unwrap();
        let settings = SrConfig {
            fast:       true,
            mode:       Mode::Test,
            output_dir: tmp.path().join("result").to_string_lossy().into_owned(),
            ..SrConfig::default()
        }
        .validate()
        .unwrap();

        let device = Default::default();
        let model  = Fsrcnn::<TestBackend>::init(&settings.model_context(), &device);
        let tiles  = tiles_for(&settings, &texture(1, 33, 27)).unwrap();

        let out = Inferencer::new(&settings).run(&model, &tiles, &device).unwrap();
        assert_eq!((out.image.height, out.image.width), (32, 26));
        assert!(out.path.ends_with("test_image.png"));
        assert_eq!(image::open(&out.path).unwrap().height(), 32);
    }
}
