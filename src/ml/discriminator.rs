// ============================================================
// Layer 5 — Discriminator
// ============================================================
// Scores high-resolution patches: → 1 for ground truth, → 0 for
// generator output.
//
//   conv 3×3 stride 2   c   → f    leaky ReLU
//   conv 3×3 stride 2   f   → 2f   leaky ReLU
//   conv 3×3 stride 2   2f  → 4f   leaky ReLU
//   global average pool → linear 4f → 1 → sigmoid
//
// One module is used for both the "fake" and the "real" scores
// of a step (`score_pair`), so the two calls always see the same
// parameters.

use burn::{
    nn::{
        conv::{Conv2d, Conv2dConfig},
        Linear, LinearConfig, PaddingConfig2d,
    },
    prelude::*,
    tensor::activation::{leaky_relu, sigmoid},
};

const NEGATIVE_SLOPE: f64 = 0.2;

#[derive(Config, Debug)]
pub struct DiscriminatorConfig {
    pub channels: usize,
    #[config(default = 32)]
    pub filters: usize,
}

impl DiscriminatorConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> Discriminator<B> {
        let widths = [self.channels, self.filters, self.filters * 2, self.filters * 4];
        let convs = widths
            .windows(2)
            .map(|w| {
                Conv2dConfig::new([w[0], w[1]], [3, 3])
                    .with_stride([2, 2])
                    .with_padding(PaddingConfig2d::Explicit(1, 1))
                    .init(device)
            })
            .collect();
        let head = LinearConfig::new(self.filters * 4, 1).init(device);
        Discriminator { convs, head }
    }
}

#[derive(Module, Debug)]
pub struct Discriminator<B: Backend> {
    convs: Vec<Conv2d<B>>,
    head:  Linear<B>,
}

impl<B: Backend> Discriminator<B> {
    /// images [n, c, h, w] → probabilities [n, 1]
    pub fn score(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        let mut x = images;
        for conv in &self.convs {
            x = leaky_relu(conv.forward(x), NEGATIVE_SLOPE);
        }
        let [n, features, _, _] = x.dims();
        let pooled = x.mean_dim(3).mean_dim(2).reshape([n, features]);
        sigmoid(self.head.forward(pooled))
    }

    /// (fake score, real score) from the same parameters.
    pub fn score_pair(
        &self,
        fake: Tensor<B, 4>,
        real: Tensor<B, 4>,
    ) -> (Tensor<B, 2>, Tensor<B, 2>) {
        (self.score(fake), self.score(real))
    }
}
