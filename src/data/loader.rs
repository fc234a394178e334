// ============================================================
// Layer 4 — Image Loader
// ============================================================
// Decodes training images from a directory with the `image`
// crate and converts them to normalised planes.
//
//   c_dim = 1 → luma (Y of ITU-R BT.601 YCbCr, studio range)
//   c_dim = 3 → RGB
//
// Files that fail to decode are logged and skipped. A missing
// directory yields an empty corpus; the pipeline reports that
// as "no training patches" further down.

use anyhow::{Context, Result};
use image::{DynamicImage, RgbImage};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::domain::image::ImagePlane;
use crate::domain::traits::ImageSource;

const EXTENSIONS: [&str; 6] = ["png", "bmp", "jpg", "jpeg", "tif", "tiff"];

/// Loads every decodable image in a directory, in file-name order.
pub struct ImageDirLoader {
    dir:   PathBuf,
    c_dim: usize,
}

impl ImageDirLoader {
    pub fn new(dir: impl Into<PathBuf>, c_dim: usize) -> Self {
        Self { dir: dir.into(), c_dim }
    }
}

impl ImageSource for ImageDirLoader {
    fn load_all(&self) -> Result<Vec<ImagePlane>> {
        if !self.dir.exists() {
            tracing::warn!(
                "Image directory '{}' does not exist, returning empty corpus",
                self.dir.display()
            );
            return Ok(Vec::new());
        }

        let mut paths: Vec<PathBuf> = fs::read_dir(&self.dir)
            .with_context(|| format!("Cannot read directory '{}'", self.dir.display()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| has_image_extension(p))
            .collect();
        paths.sort();

        let mut planes = Vec::with_capacity(paths.len());
        for path in &paths {
            match load_image(path, self.c_dim) {
                Ok(plane) => {
                    tracing::debug!(
                        "Loaded: {} ({}×{})",
                        path.display(),
                        plane.width,
                        plane.height
                    );
                    planes.push(plane);
                }
                Err(e) => tracing::warn!("Skipping '{}': {:#}", path.display(), e),
            }
        }

        tracing::info!("Loaded {} images from '{}'", planes.len(), self.dir.display());
        Ok(planes)
    }
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Decode one file into a `c_dim`-channel plane.
pub fn load_image(path: &Path, c_dim: usize) -> Result<ImagePlane> {
    let img = image::open(path)
        .with_context(|| format!("Cannot decode image '{}'", path.display()))?;
    Ok(to_plane(&img, c_dim))
}

pub fn to_plane(img: &DynamicImage, c_dim: usize) -> ImagePlane {
    let rgb = img.to_rgb8();
    if c_dim == 1 {
        luma_plane(&rgb)
    } else {
        rgb_plane(&rgb)
    }
}

/// Y = (16 + 65.481·R + 128.553·G + 24.966·B) / 255, with R, G, B in [0, 1].
pub fn luma(r: u8, g: u8, b: u8) -> f32 {
    let (r, g, b) = (r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0);
    (16.0 + 65.481 * r + 128.553 * g + 24.966 * b) / 255.0
}

fn luma_plane(rgb: &RgbImage) -> ImagePlane {
    let (w, h) = rgb.dimensions();
    let data = rgb.pixels().map(|p| luma(p[0], p[1], p[2])).collect();
    ImagePlane::new(1, h as usize, w as usize, data)
}

fn rgb_plane(rgb: &RgbImage) -> ImagePlane {
    let (w, h) = (rgb.width() as usize, rgb.height() as usize);
    let mut plane = ImagePlane::zeros(3, h, w);
    for (x, y, p) in rgb.enumerate_pixels() {
        for c in 0..3 {
            let i = plane.index(c, y as usize, x as usize);
            plane.data[i] = p[c] as f32 / 255.0;
        }
    }
    plane
}
