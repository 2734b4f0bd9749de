use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

/// Logical side length of the pod's square display, in display units.
pub const LOGICAL_SIDE: u32 = 240;

/// The mirrored pixel surface: a square RGBA8 framebuffer whose backing
/// resolution is `round(240 * density)`.
///
/// Resizing reallocates the buffer, so a density change blanks the mirror
/// until the next frame lands. Partial blits leave all other pixels intact.
pub struct PixelSurface {
    side: u32,
    pixels: Vec<u8>,
}

impl PixelSurface {
    pub fn new() -> Self {
        Self::with_side(LOGICAL_SIDE)
    }

    pub fn with_side(side: u32) -> Self {
        Self {
            side,
            pixels: vec![0; side as usize * side as usize * 4],
        }
    }

    pub fn side(&self) -> u32 {
        self.side
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Resize the backing buffer. All existing content is cleared.
    pub fn resize(&mut self, side: u32) {
        self.side = side;
        self.pixels = vec![0; side as usize * side as usize * 4];
    }

    /// Copy a `width`x`height` RGBA8 block to top-left offset `(x, y)`.
    ///
    /// `data` must hold exactly `width * height * 4` bytes. Rows and columns
    /// falling outside the surface are clipped; everything else is written
    /// row by row, leaving the rest of the surface untouched.
    pub fn blit(&mut self, x: i32, y: i32, width: u32, height: u32, data: &[u8]) {
        debug_assert_eq!(data.len(), width as usize * height as usize * 4);
        let side = self.side as i32;

        for row in 0..height as i32 {
            let dst_y = y + row;
            if dst_y < 0 || dst_y >= side {
                continue;
            }

            let src_col = if x < 0 { -x } else { 0 };
            let dst_x = x + src_col;
            if dst_x >= side {
                continue;
            }
            let copy_w = (width as i32 - src_col).min(side - dst_x);
            if copy_w <= 0 {
                continue;
            }

            let src = ((row * width as i32 + src_col) * 4) as usize;
            let dst = ((dst_y * side + dst_x) * 4) as usize;
            let len = (copy_w * 4) as usize;
            self.pixels[dst..dst + len].copy_from_slice(&data[src..src + len]);
        }
    }
}

impl Default for PixelSurface {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared surface handle between the frame pipeline (writer) and the
/// presenter (reader).
///
/// `version` is bumped on every mutation so the presenter only re-uploads
/// when something changed. `close()` marks the view as torn down; decode
/// completions landing after that are silently skipped.
pub struct SharedSurface {
    surface: Mutex<PixelSurface>,
    version: AtomicU64,
    closed: AtomicBool,
}

impl SharedSurface {
    pub fn new() -> Self {
        Self {
            surface: Mutex::new(PixelSurface::new()),
            version: AtomicU64::new(0),
            closed: AtomicBool::new(false),
        }
    }

    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    /// Resize the surface if the backing side differs. Returns true when a
    /// resize (and therefore a clear) happened.
    pub fn resize_if_needed(&self, side: u32) -> bool {
        if self.is_closed() {
            return false;
        }
        let mut surface = match self.surface.lock() {
            Ok(s) => s,
            Err(_) => return false,
        };
        if surface.side() == side {
            return false;
        }
        surface.resize(side);
        self.version.fetch_add(1, Ordering::AcqRel);
        true
    }

    /// Blit a decoded block into the surface as it exists right now.
    /// Returns false when the surface is already torn down.
    pub fn blit(&self, x: i32, y: i32, width: u32, height: u32, data: &[u8]) -> bool {
        if self.is_closed() {
            return false;
        }
        let mut surface = match self.surface.lock() {
            Ok(s) => s,
            Err(_) => return false,
        };
        surface.blit(x, y, width, height, data);
        self.version.fetch_add(1, Ordering::AcqRel);
        true
    }

    /// Clone the current side and pixels for presentation or a screenshot.
    /// Uses try_lock so the render loop never stalls on a blit in progress.
    pub fn snapshot(&self) -> Option<(u32, Vec<u8>)> {
        let surface = self.surface.try_lock().ok()?;
        Some((surface.side(), surface.pixels().to_vec()))
    }
}

impl Default for SharedSurface {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_surface_is_logical_side_and_blank() {
        let surface = PixelSurface::new();
        assert_eq!(surface.side(), 240);
        assert_eq!(surface.pixels().len(), 240 * 240 * 4);
        assert!(surface.pixels().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_resize_clears_content() {
        let mut surface = PixelSurface::new();
        surface.blit(0, 0, 1, 1, &[1, 2, 3, 4]);
        assert_eq!(&surface.pixels()[0..4], &[1, 2, 3, 4]);

        surface.resize(480);
        assert_eq!(surface.side(), 480);
        assert!(surface.pixels().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_partial_blit_touches_exact_region() {
        // Rectangle (y1=10, x1=20, y2=30, x2=40): a 20x20 block at (20, 10).
        let mut surface = PixelSurface::new();
        let block = vec![0xff; 20 * 20 * 4];
        surface.blit(20, 10, 20, 20, &block);

        let side = surface.side() as usize;
        for y in 0..side {
            for x in 0..side {
                let idx = (y * side + x) * 4;
                let inside = (20..40).contains(&x) && (10..30).contains(&y);
                let expected = if inside { 0xff } else { 0 };
                assert_eq!(
                    surface.pixels()[idx],
                    expected,
                    "pixel ({}, {}) unexpected",
                    x,
                    y
                );
            }
        }
    }

    #[test]
    fn test_blit_clips_out_of_bounds_rows_and_columns() {
        let mut surface = PixelSurface::with_side(4);
        // 3x3 block placed so one row and one column fall outside.
        let block = vec![0xaa; 3 * 3 * 4];
        surface.blit(2, 2, 3, 3, &block);

        let side = 4usize;
        for y in 0..side {
            for x in 0..side {
                let idx = (y * side + x) * 4;
                let inside = x >= 2 && y >= 2;
                let expected = if inside { 0xaa } else { 0 };
                assert_eq!(surface.pixels()[idx], expected);
            }
        }
    }

    #[test]
    fn test_shared_surface_skips_writes_after_close() {
        let shared = SharedSurface::new();
        assert!(shared.blit(0, 0, 1, 1, &[1, 1, 1, 1]));
        let version = shared.version();

        shared.close();
        assert!(!shared.blit(0, 0, 1, 1, &[2, 2, 2, 2]));
        assert!(!shared.resize_if_needed(480));
        assert_eq!(shared.version(), version);
    }

    #[test]
    fn test_shared_surface_resize_only_on_change() {
        let shared = SharedSurface::new();
        assert!(shared.resize_if_needed(480));
        assert!(!shared.resize_if_needed(480));
        let (side, _) = shared.snapshot().unwrap();
        assert_eq!(side, 480);
    }
}
