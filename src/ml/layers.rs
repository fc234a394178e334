// ============================================================
// Layer 5 — Shared Building Blocks
// ============================================================
// Layer constructors every architecture uses, the sub-pixel
// (pixel shuffle) rearrangement, and the helpers that flatten
// learnable tensors for `params` export.
//
// Spatial bookkeeping:
//   feature_conv   k = 2r+1, valid  → image_size − 2r = stride
//   same_conv      odd k, same      → size unchanged
//   upscale_deconv stride = scale   → size × scale exactly
//
// Reference: Burn Book §3 (Building Blocks)
//            Shi et al. (2016) sub-pixel convolution

use anyhow::{anyhow, Result};
use burn::{
    nn::{
        conv::{Conv2d, Conv2dConfig, ConvTranspose2d, ConvTranspose2dConfig},
        PRelu, PReluConfig, PaddingConfig2d,
    },
    prelude::*,
};
use serde::{Deserialize, Serialize};

// ─── Constructors ─────────────────────────────────────────────────────────────
/// First layer of every network: consumes the sampling border.
pub fn feature_conv<B: Backend>(
    c_in:   usize,
    c_out:  usize,
    radius: usize,
    device: &B::Device,
) -> Conv2d<B> {
    let k = radius * 2 + 1;
    Conv2dConfig::new([c_in, c_out], [k, k])
        .with_padding(PaddingConfig2d::Valid)
        .init(device)
}

/// Size-preserving convolution (`k` must be odd).
pub fn same_conv<B: Backend>(
    c_in:   usize,
    c_out:  usize,
    k:      usize,
    device: &B::Device,
) -> Conv2d<B> {
    let padding = if k == 1 {
        PaddingConfig2d::Valid
    } else {
        PaddingConfig2d::Same
    };
    Conv2dConfig::new([c_in, c_out], [k, k])
        .with_padding(padding)
        .init(device)
}

/// (padding, output padding) that make a transposed convolution with
/// `kernel` and stride `scale` map n → n·scale.
///
/// out = (n − 1)·s − 2p + k + p_out  ⇒  2p − p_out = k − s
pub fn deconv_padding(kernel: usize, scale: usize) -> (usize, usize) {
    let excess = kernel - scale;
    if excess % 2 == 0 {
        (excess / 2, 0)
    } else {
        (excess / 2 + 1, 1)
    }
}

pub fn upscale_deconv<B: Backend>(
    c_in:   usize,
    c_out:  usize,
    kernel: usize,
    scale:  usize,
    device: &B::Device,
) -> ConvTranspose2d<B> {
    let (padding, padding_out) = deconv_padding(kernel, scale);
    ConvTranspose2dConfig::new([c_in, c_out], [kernel, kernel])
        .with_stride([scale, scale])
        .with_padding([padding, padding])
        .with_padding_out([padding_out, padding_out])
        .init(device)
}

/// Channel-wise PReLU.
pub fn prelu<B: Backend>(channels: usize, device: &B::Device) -> PRelu<B> {
    PReluConfig::new()
        .with_num_parameters(channels)
        .init(device)
}

// ─── Pixel Shuffle ────────────────────────────────────────────────────────────
/// [n, c·r², h, w] → [n, c, h·r, w·r]
///
/// out[n, c, y·r + i, x·r + j] = in[n, c·r² + i·r + j, y, x]
pub fn pixel_shuffle<B: Backend>(x: Tensor<B, 4>, r: usize) -> Tensor<B, 4> {
    let [n, channels, h, w] = x.dims();
    let c = channels / (r * r);

    let x: Tensor<B, 6> = x.reshape([n, c, r, r, h, w]);
    x.permute([0, 1, 4, 2, 5, 3]).reshape([n, c, h * r, w * r])
}

// ─── Export Helpers ───────────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    Weight,
    Bias,
    Alpha,
}

/// One learnable tensor flattened for export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportedParam {
    pub name:   String,
    pub kind:   ParamKind,
    pub shape:  Vec<usize>,
    pub values: Vec<f32>,
}

fn flatten<B: Backend, const D: usize>(
    name:   String,
    kind:   ParamKind,
    tensor: Tensor<B, D>,
) -> Result<ExportedParam> {
    let data   = tensor.into_data();
    let shape  = data.shape.clone();
    let values = data
        .convert::<f32>()
        .to_vec::<f32>()
        .map_err(|e| anyhow!("Cannot read parameter '{name}': {e:?}"))?;
    Ok(ExportedParam { name, kind, shape, values })
}

pub fn export_conv<B: Backend>(name: &str, conv: &Conv2d<B>) -> Result<Vec<ExportedParam>> {
    let mut out = vec![flatten(format!("{name}.weight"), ParamKind::Weight, conv.weight.val())?];
    if let Some(bias) = &conv.bias {
        out.push(flatten(format!("{name}.bias"), ParamKind::Bias, bias.val())?);
    }
    Ok(out)
}

pub fn export_deconv<B: Backend>(
    name: &str,
    conv: &ConvTranspose2d<B>,
) -> Result<Vec<ExportedParam>> {
    let mut out = vec![flatten(format!("{name}.weight"), ParamKind::Weight, conv.weight.val())?];
    if let Some(bias) = &conv.bias {
        out.push(flatten(format!("{name}.bias"), ParamKind::Bias, bias.val())?);
    }
    Ok(out)
}

pub fn export_prelu<B: Backend>(name: &str, act: &PRelu<B>) -> Result<ExportedParam> {
    flatten(format!("{name}.alpha"), ParamKind::Alpha, act.alpha.val())
}
