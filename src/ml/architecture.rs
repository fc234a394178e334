// ============================================================
// Layer 5 — Architecture Contract
// ============================================================
// Every generator network implements `SuperResolution`. The
// orchestrator, checkpoint manager and inference runner are
// written against this trait only; which network runs is decided
// once, when `Architecture` is matched in the run use case.
//
//   images [n, c, image_size, image_size]
//       │  forward
//       ▼
//   prediction [n, c, label_size, label_size]
//       │  loss(labels, prediction)
//       ▼
//   scalar [1]

use anyhow::Result;
use burn::prelude::*;

use crate::domain::config::ModelContext;
use crate::ml::layers::ExportedParam;

pub trait SuperResolution<B: Backend>: Module<B> + Sized {
    /// Build freshly initialised parameters for `ctx`.
    fn init(ctx: &ModelContext, device: &B::Device) -> Self;

    /// Display name; the model identity lowercases it.
    fn name(&self) -> &'static str;

    /// Hyperparameters that distinguish checkpoint lineages.
    fn model_params(&self) -> Vec<usize>;

    fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 4>;

    /// Reconstruction loss, reduced to a single element.
    fn loss(&self, labels: Tensor<B, 4>, prediction: Tensor<B, 4>) -> Tensor<B, 1>;

    /// Weights, biases and PReLU alphas in layer order.
    fn export_params(&self) -> Result<Vec<ExportedParam>>;
}
