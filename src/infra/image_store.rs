// ============================================================
// Layer 6 — Image Store
// ============================================================
// Writes reconstructed planes to disk as 8-bit PNG. Values are
// scaled by 255, clipped to [0, 255] and rounded (see
// `ImagePlane::to_bytes`). Existing files are overwritten.

use anyhow::{Context, Result};
use std::{fs, path::Path};

use crate::data::preprocessor::to_image;
use crate::domain::image::ImagePlane;

/// File name of the reconstructed test image inside the output directory.
pub const TEST_IMAGE_NAME: &str = "test_image.png";

pub fn save_png(plane: &ImagePlane, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Cannot create output directory '{}'", parent.display()))?;
    }
    to_image(plane)?
        .save_with_format(path, image::ImageFormat::Png)
        .with_context(|| format!("Cannot write image '{}'", path.display()))?;
    tracing::debug!("Wrote {}×{} image to '{}'", plane.width, plane.height, path.display());
    Ok(())
}
