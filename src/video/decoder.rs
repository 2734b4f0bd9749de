//! Frame message decoding
//!
//! A frame update is a partial patch against the square mirror surface:
//! a target rectangle, the density scaling the backing resolution, and a
//! raw-deflate-compressed RGBA8 block.

use crate::core::LOGICAL_SIDE;
use anyhow::{bail, Context, Result};
use flate2::read::DeflateDecoder;
use std::io::Read;

/// One partial frame update, alive for one decode-and-blit.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderFrame {
    /// Target sub-rectangle in backing-resolution coordinates: (y1, x1, y2, x2).
    pub rectangle: [i32; 4],
    /// Scale factor from the logical 240x240 display to the backing buffer.
    pub density: f32,
    /// Deflate-compressed RGBA8 block, row-major, 4 bytes per pixel.
    pub compressed: Vec<u8>,
}

impl RenderFrame {
    /// Parse one frame-update message payload.
    ///
    /// Wire layout (big-endian): y1, x1, y2, x2 as i32, density as f32,
    /// then the compressed pixel block as the remainder.
    pub fn parse(payload: &[u8]) -> Result<Self> {
        if payload.len() < 20 {
            bail!("frame payload truncated: {} bytes", payload.len());
        }

        let mut rectangle = [0i32; 4];
        for (i, value) in rectangle.iter_mut().enumerate() {
            *value = i32::from_be_bytes(payload[i * 4..i * 4 + 4].try_into()?);
        }
        let density = f32::from_be_bytes(payload[16..20].try_into()?);

        if !(density.is_finite() && density > 0.0) {
            bail!("invalid density {}", density);
        }
        let [y1, x1, y2, x2] = rectangle;
        if x2 < x1 || y2 < y1 {
            bail!("degenerate rectangle ({}, {}, {}, {})", y1, x1, y2, x2);
        }

        Ok(Self {
            rectangle,
            density,
            compressed: payload[20..].to_vec(),
        })
    }

    /// Backing resolution implied by the density: `round(240 * density)`.
    pub fn target_side(&self) -> u32 {
        (LOGICAL_SIDE as f32 * self.density).round() as u32
    }

    pub fn width(&self) -> u32 {
        let [_, x1, _, x2] = self.rectangle;
        (x2 - x1) as u32
    }

    pub fn height(&self) -> u32 {
        let [y1, _, y2, _] = self.rectangle;
        (y2 - y1) as u32
    }
}

/// Decompress a raw deflate stream (no zlib header, matching the pod's
/// compressor).
pub fn inflate(compressed: &[u8]) -> Result<Vec<u8>> {
    let mut data = Vec::new();
    DeflateDecoder::new(compressed)
        .read_to_end(&mut data)
        .context("deflate stream corrupt")?;
    Ok(data)
}
