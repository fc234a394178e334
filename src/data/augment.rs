// ============================================================
// Layer 4 — Batch Augmentation
// ============================================================
// Every batch is presented three times per epoch:
//
//   1. as is
//   2. rotated by k·90° counter-clockwise, k drawn from 1..=3
//   3. flipped along a randomly chosen spatial axis
//
// The same transform is applied to inputs and labels so the pair
// stays aligned. Patches are square, so shapes never change.

use burn::prelude::*;
use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlipAxis {
    /// Upside down (dim 2).
    Vertical,
    /// Mirror left/right (dim 3).
    Horizontal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Augmentation {
    Identity,
    /// Quarter turns counter-clockwise.
    Rotate(u8),
    Flip(FlipAxis),
}

impl Augmentation {
    /// The three presentations of one batch, in training order.
    pub fn variants<R: Rng>(rng: &mut R) -> [Augmentation; 3] {
        let turns = rng.gen_range(1..=3u8);
        let axis  = if rng.gen_bool(0.5) { FlipAxis::Vertical } else { FlipAxis::Horizontal };
        [Augmentation::Identity, Augmentation::Rotate(turns), Augmentation::Flip(axis)]
    }

    /// Apply to an NCHW tensor.
    pub fn apply<B: Backend>(self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        match self {
            Augmentation::Identity => x,
            Augmentation::Rotate(turns) => {
                (0..turns % 4).fold(x, |t, _| t.flip([3]).swap_dims(2, 3))
            }
            Augmentation::Flip(FlipAxis::Vertical)   => x.flip([2]),
            Augmentation::Flip(FlipAxis::Horizontal) => x.flip([3]),
        }
    }

    /// Same transform on inputs and labels.
    pub fn apply_pair<B: Backend>(
        self,
        inputs: Tensor<B, 4>,
        labels: Tensor<B, 4>,
    ) -> (Tensor<B, 4>, Tensor<B, 4>) {
        (self.apply(inputs), self.apply(labels))
    }
}
