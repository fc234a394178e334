// ============================================================
// Layer 5 — FSRCNN
// ============================================================
// Dong et al. (2016), "Accelerating the Super-Resolution
// Convolutional Neural Network".
//
//   feature   conv (2r+1)², valid   c → d   PReLU
//   shrink    conv 1×1              d → s   PReLU
//   mapping   m × conv 3×3, same    s → s   PReLU
//   expand    conv 1×1              s → d   PReLU
//   deconv    9×9, stride = scale   d → c
//
// (d, s, m) = (56, 12, 4); fast mode uses FSRCNN-s (32, 5, 1).

use anyhow::Result;
use burn::{
    nn::{
        conv::{Conv2d, ConvTranspose2d},
        loss::{MseLoss, Reduction},
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

const PARAMS:      [usize; 3] = [56, 12, 4];
const FAST_PARAMS: [usize; 3] = [32, 5, 1];
const DECONV_KERNEL: usize = 9;

#[derive(Module, Debug)]
pub struct Fsrcnn<B: Backend> {
    feature:     Conv2d<B>,
    feature_act: PRelu<B>,
    shrink:      Conv2d<B>,
    shrink_act:  PRelu<B>,
    mapping:     Vec<Conv2d<B>>,
    mapping_act: Vec<PRelu<B>>,
    expand:      Conv2d<B>,
    expand_act:  PRelu<B>,
    deconv:      ConvTranspose2d<B>,
    d:           usize,
    s:           usize,
    m:           usize,
}

impl<B: Backend> SuperResolution<B> for Fsrcnn<B> {
    fn init(ctx: &ModelContext, device: &B::Device) -> Self {
        let [d, s, m] = if ctx.fast { FAST_PARAMS } else { PARAMS };
        let c = ctx.c_dim;

        Self {
            feature:     feature_conv(c, d, ctx.radius, device),
            feature_act: prelu(d, device),
            shrink:      same_conv(d, s, 1, device),
            shrink_act:  prelu(s, device),
            mapping:     (0..m).map(|_| same_conv(s, s, 3, device)).collect(),
            mapping_act: (0..m).map(|_| prelu(s, device)).collect(),
            expand:      same_conv(s, d, 1, device),
            expand_act:  prelu(d, device),
            deconv:      upscale_deconv(d, c, DECONV_KERNEL, ctx.scale, device),
            d,
            s,
            m,
        }
    }

    fn name(&self) -> &'static str {
        "FSRCNN"
    }

    fn model_params(&self) -> Vec<usize> {
        vec![self.d, self.s, self.m]
    }

    fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = self.feature_act.forward(self.feature.forward(images));
        let mut x = self.shrink_act.forward(self.shrink.forward(x));
        for (conv, act) in self.mapping.iter().zip(&self.mapping_act) {
            x = act.forward(conv.forward(x));
        }
        let x = self.expand_act.forward(self.expand.forward(x));
        self.deconv.forward(x)
    }

    fn loss(&self, labels: Tensor<B, 4>, prediction: Tensor<B, 4>) -> Tensor<B, 1> {
        MseLoss::new().forward(prediction, labels, Reduction::Mean)
    }

    fn export_params(&self) -> Result<Vec<ExportedParam>> {
        let mut out = export_conv("feature", &self.feature)?;
        out.push(export_prelu("feature", &self.feature_act)?);
        out.extend(export_conv("shrink", &self.shrink)?);
        out.push(export_prelu("shrink", &self.shrink_act)?);
        for (i, (conv, act)) in self.mapping.iter().zip(&self.mapping_act).enumerate() {
            out.extend(export_conv(&format!("mapping.{i}"), conv)?);
            out.push(export_prelu(&format!("mapping.{i}"), act)?);
        }
        out.extend(export_conv("expand", &self.expand)?);
        out.push(export_prelu("expand", &self.expand_act)?);
        out.extend(export_deconv("deconv", &self.deconv)?);
        Ok(out)
    }
}
