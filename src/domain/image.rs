// ============================================================
// Layer 3 — Image Plane
// ============================================================
// A decoded image held as normalised f32 samples in planar
// CHW order (all of channel 0, then channel 1, ...).
//
// CHW matches burn's NCHW tensor layout, so a patch cut from
// a plane can be appended to a batch buffer without shuffling.
//
// Values are in [0, 1]; conversion to and from 8-bit happens
// only at the I/O boundary (data::loader, infra::image_store).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImagePlane {
    pub channels: usize,
    pub height:   usize,
    pub width:    usize,
    pub data:     Vec<f32>,
}

impl ImagePlane {
    pub fn new(channels: usize, height: usize, width: usize, data: Vec<f32>) -> Self {
        debug_assert_eq!(data.len(), channels * height * width);
        Self { channels, height, width, data }
    }

    pub fn zeros(channels: usize, height: usize, width: usize) -> Self {
        Self::new(channels, height, width, vec![0.0; channels * height * width])
    }

    #[inline]
    pub fn index(&self, c: usize, y: usize, x: usize) -> usize {
        (c * self.height + y) * self.width + x
    }

    #[inline]
    pub fn get(&self, c: usize, y: usize, x: usize) -> f32 {
        self.data[self.index(c, y, x)]
    }

    /// Square crop of `size` pixels at (top, left), flattened CHW.
    pub fn crop(&self, top: usize, left: usize, size: usize) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.channels * size * size);
        for c in 0..self.channels {
            for y in top..top + size {
                let row = self.index(c, y, left);
                out.extend_from_slice(&self.data[row..row + size]);
            }
        }
        out
    }

    /// Copy a square CHW block into this plane at (top, left),
    /// clipping whatever falls outside.
    pub fn paste(&mut self, block: &[f32], top: usize, left: usize, size: usize) {
        for c in 0..self.channels {
            for dy in 0..size {
                let y = top + dy;
                if y >= self.height {
                    break;
                }
                for dx in 0..size {
                    let x = left + dx;
                    if x >= self.width {
                        break;
                    }
                    let i = self.index(c, y, x);
                    self.data[i] = block[(c * size + dy) * size + dx];
                }
            }
        }
    }

    /// True when either side is zero.
    pub fn is_empty(&self) -> bool {
        self.height == 0 || self.width == 0
    }

    /// Grow the plane by `top/left` and `bottom/right` pixels,
    /// replicating the nearest edge sample.
    pub fn pad_edge(&self, before: usize, after_y: usize, after_x: usize) -> Self {
        let height = self.height + before + after_y;
        let width  = self.width + before + after_x;
        let mut out = Self::zeros(self.channels, height, width);
        if self.is_empty() {
            return out;
        }

        for c in 0..self.channels {
            for y in 0..height {
                let sy = y.saturating_sub(before).min(self.height - 1);
                for x in 0..width {
                    let sx = x.saturating_sub(before).min(self.width - 1);
                    let i = out.index(c, y, x);
                    out.data[i] = self.get(c, sy, sx);
                }
            }
        }
        out
    }

    /// Interleaved HWC bytes: ×255, clipped to [0, 255], rounded.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.data.len());
        for y in 0..self.height {
            for x in 0..self.width {
                for c in 0..self.channels {
                    let v = (self.get(c, y, x) * 255.0).clamp(0.0, 255.0).round();
                    out.push(v as u8);
                }
            }
        }
        out
    }

    /// Top-left region of `height` × `width`.
    pub fn crop_to(&self, height: usize, width: usize) -> Self {
        let mut data = Vec::with_capacity(self.channels * height * width);
        for c in 0..self.channels {
            for y in 0..height {
                let row = self.index(c, y, 0);
                data.extend_from_slice(&self.data[row..row + width]);
            }
        }
        Self::new(self.channels, height, width, data)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(channels: usize, height: usize, width: usize) -> ImagePlane {
        let n = channels * height * width;
        ImagePlane::new(channels, height, width, (0..n).map(|v| v as f32).collect())
    }

    #[test]
    fn test_crop_then_paste_restores_block() {
        let src   = ramp(2, 6, 6);
        let block = src.crop(1, 2, 3);
        assert_eq!(block.len(), 2 * 3 * 3);
        assert_eq!(block[0], src.get(0, 1, 2));
        assert_eq!(block[9], src.get(1, 1, 2));

        let mut dst = ImagePlane::zeros(2, 6, 6);
        dst.paste(&block, 1, 2, 3);
        assert_eq!(dst.get(1, 3, 4), src.get(1, 3, 4));
        assert_eq!(dst.get(0, 0, 0), 0.0);
    }

    #[test]
    fn test_paste_clips_at_border() {
        let mut dst = ImagePlane::zeros(1, 4, 4);
        dst.paste(&[1.0; 9], 2, 2, 3);
        assert_eq!(dst.get(0, 3, 3), 1.0);
        assert_eq!(dst.get(0, 1, 1), 0.0);
    }

    #[test]
    fn test_to_bytes_interleaves_and_clips() {
        let plane = ImagePlane::new(2, 1, 2, vec![0.0, 1.5, -0.2, 0.5]);
        // (c0,x0) (c1,x0) (c0,x1) (c1,x1)
        assert_eq!(plane.to_bytes(), vec![0, 0, 255, 128]);
    }

    #[test]
    fn test_pad_edge_replicates() {
        let src    = ramp(1, 2, 2);
        let padded = src.pad_edge(1, 2, 1);
        assert_eq!((padded.height, padded.width), (5, 4));
        assert_eq!(padded.get(0, 0, 0), src.get(0, 0, 0));
        assert_eq!(padded.get(0, 4, 3), src.get(0, 1, 1));
        assert_eq!(padded.get(0, 1, 1), src.get(0, 0, 0));
    }

    #[test]
    fn test_pad_edge_of_empty_plane_is_zero() {
        let empty  = ImagePlane::zeros(1, 0, 20);
        let padded = empty.pad_edge(1, 1, 1);
        assert_eq!((padded.height, padded.width), (2, 22));
        assert!(padded.data.iter().all(|&v| v == 0.0));
    }
}
