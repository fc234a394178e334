// ============================================================
// Layer 4 — Patch Batcher
// ============================================================
// Implements burn's Batcher trait: stacks flattened CHW patches
// into NCHW tensors on the target device.
//
//   Vec<PatchPair> (N items)
//       │
//       ▼
//   inputs [N, C, image_size, image_size]
//   labels [N, C, label_size, label_size]

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::domain::patch::PatchPair;

#[derive(Debug, Clone)]
pub struct PatchBatch<B: Backend> {
    pub inputs:     Tensor<B, 4>,
    pub labels:     Tensor<B, 4>,
    pub batch_size: usize,
}

#[derive(Clone, Debug)]
pub struct PatchBatcher<B: Backend> {
    device:     B::Device,
    c_dim:      usize,
    image_size: usize,
    label_size: usize,
}

impl<B: Backend> PatchBatcher<B> {
    pub fn new(device: B::Device, c_dim: usize, image_size: usize, label_size: usize) -> Self {
        Self { device, c_dim, image_size, label_size }
    }

    /// Stack flattened CHW patches of side `size` into one NCHW tensor.
    pub fn stack<'a>(&self, patches: impl Iterator<Item = &'a [f32]>, size: usize) -> Tensor<B, 4> {
        let flat: Vec<f32> = patches.flat_map(|p| p.iter().copied()).collect();
        let n = flat.len() / (self.c_dim * size * size);
        Tensor::from_data(TensorData::new(flat, [n, self.c_dim, size, size]), &self.device)
    }
}

impl<B: Backend> Batcher<PatchPair, PatchBatch<B>> for PatchBatcher<B> {
    fn batch(&self, items: Vec<PatchPair>) -> PatchBatch<B> {
        let batch_size = items.len();
        let inputs = self.stack(items.iter().map(|p| p.input.as_slice()), self.image_size);
        let labels = self.stack(items.iter().map(|p| p.label.as_slice()), self.label_size);
        PatchBatch { inputs, labels, batch_size }
    }
}
