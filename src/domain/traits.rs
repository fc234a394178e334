// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// Seams between the data layer and the rest of the program.
// The patch builder only sees `ImageSource`, so tests can feed
// it synthetic images instead of a directory on disk.

use anyhow::Result;

use crate::domain::image::ImagePlane;

// ─── ImageSource ──────────────────────────────────────────────────────────────
/// Anything that can hand over a set of decoded training images.
///
/// Implementations:
///   - ImageDirLoader  → every decodable image in a directory
///   - Vec<ImagePlane> → images already in memory
pub trait ImageSource {
    fn load_all(&self) -> Result<Vec<ImagePlane>>;
}

impl ImageSource for Vec<ImagePlane> {
    fn load_all(&self) -> Result<Vec<ImagePlane>> {
        Ok(self.clone())
    }
}
