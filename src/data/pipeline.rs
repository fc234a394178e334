// ============================================================
// Layer 4 — Patch Pipeline
// ============================================================
// Wires loader → preprocessor → patcher for both modes.
//
//   train:  every image in data_dir
//             → (HR, LR) → aligned patch pairs → shuffled dataset
//   test:   the single test image
//             → (HR, LR) → row-major tiles
//
// With threads > 1 the per-image work runs on a dedicated rayon
// pool. Each image gets its own RNG seeded from the run RNG, so a
// seeded run builds the same dataset regardless of thread count.

use anyhow::{bail, Context, Result};
use rand::{rngs::StdRng, Rng, SeedableRng};
use rayon::prelude::*;
use std::path::Path;

use crate::data::{
    dataset::PatchDataset,
    loader::load_image,
    patcher::Patcher,
    preprocessor::Preprocessor,
};
use crate::domain::{
    config::Settings,
    image::ImagePlane,
    patch::{PatchPair, TestTiles},
    traits::ImageSource,
};

fn patcher(settings: &Settings) -> Patcher {
    Patcher::new(settings.geometry, settings.config.scale, settings.config.radius)
}

fn image_pairs(
    settings: &Settings,
    plane:    &ImagePlane,
    seed:     u64,
) -> Result<Vec<PatchPair>> {
    let cfg = &settings.config;
    if plane.height < cfg.scale || plane.width < cfg.scale {
        tracing::warn!(
            "Skipping {}×{} image, smaller than scale {}",
            plane.height,
            plane.width,
            cfg.scale,
        );
        return Ok(Vec::new());
    }
    let mut rng  = StdRng::seed_from_u64(seed);
    let (hr, lr) = Preprocessor::new(cfg.scale).prepare(plane, cfg.distort, &mut rng)?;
    Ok(patcher(settings).train_pairs(&hr, &lr))
}

/// Shuffled training patches from every image `source` yields.
pub fn train_dataset<S: ImageSource, R: Rng>(
    source:   &S,
    settings: &Settings,
    rng:      &mut R,
) -> Result<PatchDataset> {
    let images  = source.load_all()?;
    let seeds: Vec<u64> = images.iter().map(|_| rng.gen()).collect();
    let threads = settings.config.threads;

    let per_image: Vec<Vec<PatchPair>> = if threads == 1 {
        images
            .iter()
            .zip(&seeds)
            .map(|(plane, &seed)| image_pairs(settings, plane, seed))
            .collect::<Result<_>>()?
    } else {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .context("Failed to build the patch worker pool")?;
        pool.install(|| {
            images
                .par_iter()
                .zip(seeds.par_iter())
                .map(|(plane, &seed)| image_pairs(settings, plane, seed))
                .collect::<Result<_>>()
        })?
    };

    let pairs: Vec<PatchPair> = per_image.into_iter().flatten().collect();
    tracing::info!(
        "Built {} training patches from {} images ({} thread(s))",
        pairs.len(),
        images.len(),
        threads,
    );

    let mut dataset = PatchDataset::new(pairs);
    dataset.shuffle(rng);
    Ok(dataset)
}

/// Tiles of the configured test image.
pub fn test_tiles(settings: &Settings) -> Result<TestTiles> {
    let cfg  = &settings.config;
    let path = Path::new(&cfg.test_image);
    if !path.is_file() {
        bail!("Test image '{}' not found", path.display());
    }

    let plane = load_image(path, cfg.c_dim)?;
    tiles_for(settings, &plane)
}

/// Tiles of an already decoded image. The test image is never distorted.
pub fn tiles_for(settings: &Settings, plane: &ImagePlane) -> Result<TestTiles> {
    let scale = settings.config.scale;
    if plane.height < scale || plane.width < scale {
        bail!(
            "Test image is {}×{}, smaller than scale factor {}",
            plane.height,
            plane.width,
            scale,
        );
    }
    let pre = Preprocessor::new(scale);
    let hr  = pre.modcrop(plane);
    let lr  = pre.downscale(&hr)?;
    let tiles = patcher(settings).test_tiles(&hr, &lr);
    tracing::debug!("Test image tiled into {} × {} tiles", tiles.nx, tiles.ny);
    Ok(tiles)
}
