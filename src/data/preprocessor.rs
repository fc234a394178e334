// ============================================================
// Layer 4 — Image Preprocessor
// ============================================================
// Turns one high-resolution plane into the (HR, LR) pair the
// patcher cuts from:
//
//   1. modcrop    trim width/height to a multiple of `scale`
//   2. downscale  bicubic (Catmull-Rom) resize by 1/scale
//   3. distort    optional: JPEG round trip of the LR image at a
//                 random quality, so the network also learns to
//                 undo compression artefacts
//
// Resizing runs per channel on f32 buffers so no precision is
// lost to 8-bit quantisation; only the distortion step goes
// through bytes (JPEG needs them).

use anyhow::{anyhow, Context, Result};
use image::{
    codecs::jpeg::JpegEncoder,
    imageops::{self, FilterType},
    DynamicImage, GrayImage, ImageBuffer, Luma, RgbImage,
};
use rand::Rng;

use crate::data::loader::to_plane;
use crate::domain::image::ImagePlane;

/// JPEG quality range used by `distort`.
const JPEG_QUALITY: std::ops::RangeInclusive<u8> = 60..=95;

pub struct Preprocessor {
    scale: usize,
}

impl Preprocessor {
    pub fn new(scale: usize) -> Self {
        Self { scale }
    }

    /// Crop so both sides divide evenly by the scale factor.
    pub fn modcrop(&self, plane: &ImagePlane) -> ImagePlane {
        let h = plane.height - plane.height % self.scale;
        let w = plane.width - plane.width % self.scale;
        plane.crop_to(h, w)
    }

    /// Bicubic downscale by the scale factor. Expects a modcropped plane.
    pub fn downscale(&self, plane: &ImagePlane) -> Result<ImagePlane> {
        resize(plane, plane.height / self.scale, plane.width / self.scale)
    }

    /// (HR, LR) for one source image.
    pub fn prepare<R: Rng>(
        &self,
        plane:   &ImagePlane,
        distort: bool,
        rng:     &mut R,
    ) -> Result<(ImagePlane, ImagePlane)> {
        let hr = self.modcrop(plane);
        let mut lr = self.downscale(&hr)?;
        if distort {
            lr = jpeg_distort(&lr, rng.gen_range(JPEG_QUALITY))?;
        }
        Ok((hr, lr))
    }
}

/// Per-channel Catmull-Rom resize, clipped back into [0, 1].
pub fn resize(plane: &ImagePlane, height: usize, width: usize) -> Result<ImagePlane> {
    let area = plane.height * plane.width;
    let mut data = Vec::with_capacity(plane.channels * height * width);

    for c in 0..plane.channels {
        let channel = plane.data[c * area..(c + 1) * area].to_vec();
        let buf: ImageBuffer<Luma<f32>, Vec<f32>> =
            ImageBuffer::from_raw(plane.width as u32, plane.height as u32, channel)
                .ok_or_else(|| anyhow!("plane buffer does not match its dimensions"))?;
        let resized = imageops::resize(&buf, width as u32, height as u32, FilterType::CatmullRom);
        data.extend(resized.into_raw().into_iter().map(|v| v.clamp(0.0, 1.0)));
    }

    Ok(ImagePlane::new(plane.channels, height, width, data))
}

/// Plane → 8-bit image (luma planes become grayscale).
pub fn to_image(plane: &ImagePlane) -> Result<DynamicImage> {
    let (w, h) = (plane.width as u32, plane.height as u32);
    let bytes = plane.to_bytes();
    let img = match plane.channels {
        1 => GrayImage::from_raw(w, h, bytes).map(DynamicImage::ImageLuma8),
        3 => RgbImage::from_raw(w, h, bytes).map(DynamicImage::ImageRgb8),
        c => return Err(anyhow!("cannot build an image from {c} channels")),
    };
    img.ok_or_else(|| anyhow!("plane buffer does not match its dimensions"))
}

/// Encode as JPEG at `quality` and decode again.
pub fn jpeg_distort(plane: &ImagePlane, quality: u8) -> Result<ImagePlane> {
    let img = to_image(plane)?;
    let mut encoded = Vec::new();
    img.write_with_encoder(JpegEncoder::new_with_quality(&mut encoded, quality))
        .context("JPEG encoding failed")?;

    let decoded = image::load_from_memory(&encoded).context("JPEG decoding failed")?;
    Ok(match plane.channels {
        1 => {
            let gray = decoded.to_luma8();
            let data = gray.pixels().map(|p| p[0] as f32 / 255.0).collect();
            ImagePlane::new(1, plane.height, plane.width, data)
        }
        _ => to_plane(&decoded, 3),
    })
}
