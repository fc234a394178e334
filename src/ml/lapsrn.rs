// ============================================================
// Layer 5 — LapSRN (single pyramid level)
// ============================================================
// Lai et al. (2017), "Deep Laplacian Pyramid Networks for Fast
// and Accurate Super-Resolution".
//
// Two branches meet at the output:
//
//   feature branch   conv (2r+1)², valid + PReLU
//                    depth × (conv 3×3 + PReLU)
//                    deconv ×scale, conv 3×3 → residual
//
//   image branch     centre crop (drop the sampling border)
//                    deconv ×scale → coarse upscale
//
//   output = coarse upscale + residual
//
// (f, depth) = (64, 5); fast mode uses (32, 3). Trained with the
// Charbonnier penalty sqrt((t − p)² + 1e-6).

use anyhow::Result;
use burn::{
    nn::{
        conv::{Conv2d, ConvTranspose2d},
        PRelu,
    },
    prelude::*,
};

use crate::domain::config::ModelContext;
use crate::ml::architecture::SuperResolution;
use crate::ml::layers::{
    export_conv, export_deconv, export_prelu, feature_conv, prelu, same_conv, upscale_deconv,
    ExportedParam,
};

const PARAMS:      [usize; 2] = [64, 5];
const FAST_PARAMS: [usize; 2] = [32, 3];
const UPSAMPLE_KERNEL: usize = 4;
const CHARBONNIER_EPS_SQ: f64 = 1e-6;

#[derive(Module, Debug)]
pub struct LapSrn<B: Backend> {
    feature:     Conv2d<B>,
    feature_act: PRelu<B>,
    body:        Vec<Conv2d<B>>,
    body_act:    Vec<PRelu<B>>,
    upsample:    ConvTranspose2d<B>,
    residual:    Conv2d<B>,
    image_up:    ConvTranspose2d<B>,
    radius:      usize,
    filters:     usize,
    depth:       usize,
}

impl<B: Backend> SuperResolution<B> for LapSrn<B> {
    fn init(ctx: &ModelContext, device: &B::Device) -> Self {
        let [filters, depth] = if ctx.fast { FAST_PARAMS } else { PARAMS };
        let c = ctx.c_dim;

        Self {
            feature:     feature_conv(c, filters, ctx.radius, device),
            feature_act: prelu(filters, device),
            body:        (0..depth).map(|_| same_conv(filters, filters, 3, device)).collect(),
            body_act:    (0..depth).map(|_| prelu(filters, device)).collect(),
            upsample:    upscale_deconv(filters, filters, UPSAMPLE_KERNEL, ctx.scale, device),
            residual:    same_conv(filters, c, 3, device),
            image_up:    upscale_deconv(c, c, UPSAMPLE_KERNEL, ctx.scale, device),
            radius:      ctx.radius,
            filters,
            depth,
        }
    }

    fn name(&self) -> &'static str {
        "LapSRN"
    }

    fn model_params(&self) -> Vec<usize> {
        vec![self.filters, self.depth]
    }

    fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 4> {
        let [n, c, h, w] = images.dims();
        let r = self.radius;
        let centre = images
            .clone()
            .slice([0..n, 0..c, r..h - r, r..w - r]);

        let mut x = self.feature_act.forward(self.feature.forward(images));
        for (conv, act) in self.body.iter().zip(&self.body_act) {
            x = act.forward(conv.forward(x));
        }
        let residual = self.residual.forward(self.upsample.forward(x));

        self.image_up.forward(centre) + residual
    }

    fn loss(&self, labels: Tensor<B, 4>, prediction: Tensor<B, 4>) -> Tensor<B, 1> {
        (labels - prediction)
            .powf_scalar(2.0)
            .add_scalar(CHARBONNIER_EPS_SQ)
            .sqrt()
            .mean()
    }

    fn export_params(&self) -> Result<Vec<ExportedParam>> {
        let mut out = export_conv("feature", &self.feature)?;
        out.push(export_prelu("feature", &self.feature_act)?);
        for (i, (conv, act)) in self.body.iter().zip(&self.body_act).enumerate() {
            out.extend(export_conv(&format!("body.{i}"), conv)?);
            out.push(export_prelu(&format!("body.{i}"), act)?);
        }
        out.extend(export_deconv("upsample", &self.upsample)?);
        out.extend(export_conv("residual", &self.residual)?);
        out.extend(export_deconv("image_up", &self.image_up)?);
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
        for scale in 2..=4 {
            let (base, label_size) = crate::domain::config::SCALE_FACTORS[scale - 2];
            let ctx = ModelContext {
                c_dim: 1, scale, radius: 1, fast: true, image_size: base + 2, label_size,
            };
            let model = LapSrn::<TestBackend>::init(&ctx, &device);
            let x = Tensor::<TestBackend, 4>::zeros([3, 1, ctx.image_size, ctx.image_size], &device);
            assert_eq!(model.forward(x).dims(), [3, 1, label_size, label_size]);
        }
    }

    #[test]
    fn test_charbonnier_loss() {
        let device = Default::default();
        let ctx = ModelContext {
            c_dim: 1, scale: 2, radius: 1, fast: true, image_size: 12, label_size: 20,
        };
        let model  = LapSrn::<TestBackend>::init(&ctx, &device);
        let labels = Tensor::<TestBackend, 4>::full([1, 1, 2, 2], 0.5, &device);
        let pred   = Tensor::<TestBackend, 4>::full([1, 1, 2, 2], 0.5, &device);
        let loss: f32 = model.loss(labels, pred).into_scalar().elem();
        // identical tensors leave only sqrt(1e-6)
        assert!((loss - 1e-3).abs() < 1e-5);
        assert_eq!(model.name(), "LapSRN");
    }
}
