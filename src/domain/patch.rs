// ============================================================
// Layer 3 — Patch Pair
// ============================================================
// One training example: a low-resolution input patch (with its
// sampling border) and the high-resolution label patch covering
// the same area. Both are flattened CHW.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchPair {
    /// `c_dim × image_size × image_size`
    pub input: Vec<f32>,

    /// `c_dim × label_size × label_size`
    pub label: Vec<f32>,
}

impl PatchPair {
    pub fn new(input: Vec<f32>, label: Vec<f32>) -> Self {
        Self { input, label }
    }
}

/// Full-image tiling handed to the inference runner.
#[derive(Debug, Clone)]
pub struct TestTiles {
    /// Input tiles in row-major order, each `c × image_size²`.
    pub inputs: Vec<Vec<f32>>,

    /// Matching HR tiles, each `c × label_size²`.
    pub labels: Vec<Vec<f32>>,

    /// Tiles per row.
    pub nx: usize,

    /// Tile rows.
    pub ny: usize,

    /// Extent of the upscaled image the merged prediction is cropped to.
    pub target_height: usize,
    pub target_width:  usize,
}

impl TestTiles {
    pub fn len(&self) -> usize {
        self.inputs.len()
    }
}
