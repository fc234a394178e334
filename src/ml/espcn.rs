// ============================================================
// Layer 5 — ESPCN
// ============================================================
// Shi et al. (2016), "Real-Time Single Image and Video Super-
// Resolution Using an Efficient Sub-Pixel Convolutional Neural
// Network".
//
//   feature   conv (2r+1)², valid   c  → n1        tanh
//   hidden    conv 3×3, same        n1 → n2        tanh
//   subpixel  conv 3×3, same        n2 → c·scale²
//   pixel shuffle                   → [c, h·scale, w·scale]
//
// (n1, n2) = (64, 32); fast mode uses (32, 16).

use anyhow::Result;
use burn::{
    nn::{
        conv::Conv2d,
        loss::{MseLoss, Reduction},
    },
    prelude::*,
    tensor::activation::tanh,
};

use crate::domain::config::ModelContext;
use crate::ml::architecture::SuperResolution;
use crate::ml::layers::{export_conv, feature_conv, pixel_shuffle, same_conv, ExportedParam};

const PARAMS:      [usize; 2] = [64, 32];
const FAST_PARAMS: [usize; 2] = [32, 16];

#[derive(Module, Debug)]
pub struct Espcn<B: Backend> {
    feature:  Conv2d<B>,
    hidden:   Conv2d<B>,
    subpixel: Conv2d<B>,
    scale:    usize,
    n1:       usize,
    n2:       usize,
}

impl<B: Backend> SuperResolution<B> for Espcn<B> {
    fn init(ctx: &ModelContext, device: &B::Device) -> Self {
        let [n1, n2] = if ctx.fast { FAST_PARAMS } else { PARAMS };
        let c = ctx.c_dim;

        Self {
            feature:  feature_conv(c, n1, ctx.radius, device),
            hidden:   same_conv(n1, n2, 3, device),
            subpixel: same_conv(n2, c * ctx.scale * ctx.scale, 3, device),
            scale:    ctx.scale,
            n1,
            n2,
        }
    }

    fn name(&self) -> &'static str {
        "ESPCN"
    }

    fn model_params(&self) -> Vec<usize> {
        vec![self.n1, self.n2]
    }

    fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = tanh(self.feature.forward(images));
        let x = tanh(self.hidden.forward(x));
        pixel_shuffle(self.subpixel.forward(x), self.scale)
    }

    fn loss(&self, labels: Tensor<B, 4>, prediction: Tensor<B, 4>) -> Tensor<B, 1> {
        MseLoss::new().forward(prediction, labels, Reduction::Mean)
    }

    fn export_params(&self) -> Result<Vec<ExportedParam>> {
        let mut out = export_conv("feature", &self.feature)?;
        out.extend(export_conv("hidden", &self.hidden)?);
        out.extend(export_conv("subpixel", &self.subpixel)?);
        Ok(out)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    #[test]
    fn test_output_matches_label_size() {
        let device = Default::default();
        for (scale, c_dim) in [(2, 1), (3, 3), (4, 1)] {
            let (base, label_size) = crate::domain::config::SCALE_FACTORS[scale - 2];
            let ctx = ModelContext {
                c_dim, scale, radius: 2, fast: true, image_size: base + 4, label_size,
            };
            let model = Espcn::<TestBackend>::init(&ctx, &device);
            let x = Tensor::<TestBackend, 4>::zeros([1, c_dim, ctx.image_size, ctx.image_size], &device);
            assert_eq!(model.forward(x).dims(), [1, c_dim, label_size, label_size]);
            assert_eq!(model.model_params(), vec![32, 16]);
        }
    }
}
