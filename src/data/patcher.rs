// ============================================================
// Layer 4 — Patcher
// ============================================================
// Cuts aligned (LR input, HR label) patches out of an image
// pair with a sliding window.
//
// The LR image is first padded by `radius` on every side
// (edge replication), so an input patch of `image_size` covers
// `stride` LR pixels plus the sampling border the network's
// first convolution consumes:
//
//   LR padded  ┌──────────────────────┐
//              │ r ┌──────────┐       │   input  = image_size²
//              │   │  stride  │       │   label  = (stride·scale)²
//              │   └──────────┘       │          = label_size²
//              └──────────────────────┘
//
// Training windows advance by `stride` and stop before running
// off the image. Test tiles cover the whole image: the padded
// LR image is extended to a whole number of tiles and tiled in
// row-major order (row 0 left→right, then row 1, ...), which is
// the order the inference runner merges in.

use crate::domain::config::Geometry;
use crate::domain::image::ImagePlane;
use crate::domain::patch::{PatchPair, TestTiles};

pub struct Patcher {
    geometry: Geometry,
    scale:    usize,
    radius:   usize,
}

impl Patcher {
    pub fn new(geometry: Geometry, scale: usize, radius: usize) -> Self {
        Self { geometry, scale, radius }
    }

    /// Top-left LR offsets of every full training window along one axis.
    fn offsets(&self, lr_extent: usize) -> Vec<usize> {
        let stride = self.geometry.stride;
        if lr_extent < stride {
            return Vec::new();
        }
        (0..=lr_extent - stride).step_by(stride).collect()
    }

    /// Training pairs from an (HR, LR) image pair. `hr` must be `lr` × scale.
    pub fn train_pairs(&self, hr: &ImagePlane, lr: &ImagePlane) -> Vec<PatchPair> {
        if lr.is_empty() {
            return Vec::new();
        }
        let r      = self.radius;
        let padded = lr.pad_edge(r, r, r);
        let g      = self.geometry;

        let mut pairs = Vec::new();
        for top in self.offsets(lr.height) {
            for left in self.offsets(lr.width) {
                let input = padded.crop(top, left, g.image_size);
                let label = hr.crop(top * self.scale, left * self.scale, g.label_size);
                pairs.push(PatchPair::new(input, label));
            }
        }
        pairs
    }

    /// Row-major tiles covering all of `lr`, with the HR tiles under them.
    pub fn test_tiles(&self, hr: &ImagePlane, lr: &ImagePlane) -> TestTiles {
        let Geometry { image_size, label_size, stride, .. } = self.geometry;
        let nx = lr.width.div_ceil(stride);
        let ny = lr.height.div_ceil(stride);

        let r = self.radius;
        let padded    = lr.pad_edge(r, r + ny * stride - lr.height, r + nx * stride - lr.width);
        let hr_padded = hr.pad_edge(0, ny * label_size - hr.height, nx * label_size - hr.width);

        let mut inputs = Vec::with_capacity(nx * ny);
        let mut labels = Vec::with_capacity(nx * ny);
        for row in 0..ny {
            for col in 0..nx {
                inputs.push(padded.crop(row * stride, col * stride, image_size));
                labels.push(hr_padded.crop(row * label_size, col * label_size, label_size));
            }
        }

        TestTiles {
            inputs,
            labels,
            nx,
            ny,
            target_height: lr.height * self.scale,
            target_width:  lr.width * self.scale,
        }
    }
}
