//! Frame decoding pipeline
//!
//! Consumes frame-update payloads from the stream subscription, resizes the
//! shared surface when the density changes, decompresses the pixel block and
//! blits it. A bad message drops that frame only; the stream continues.

use crate::core::SharedSurface;
use crate::video::decoder::{inflate, RenderFrame};
use crate::{log_verbose, log_warn};
use crossbeam_channel::Receiver;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

/// Sanity cap on the backing resolution implied by a frame's density.
const MAX_SURFACE_SIDE: u32 = 4096;

/// Start the decoder thread that applies frame updates to `surface`.
pub fn start_frame_pipeline(
    rx: Receiver<Vec<u8>>,
    surface: Arc<SharedSurface>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let mut frame_count = 0u64;
        let start = Instant::now();
        let mut last_log = Instant::now();

        while let Ok(payload) = rx.recv() {
            let frame = match RenderFrame::parse(&payload) {
                Ok(frame) => frame,
                Err(e) => {
                    log_warn!("FRAME", "Bad frame message: {}", e);
                    continue;
                }
            };

            let side = frame.target_side();
            if side == 0 || side > MAX_SURFACE_SIDE {
                log_warn!("FRAME", "Implausible backing side {}, frame dropped", side);
                continue;
            }

            // Density change reallocates the backing buffer and blanks the
            // mirror until the next frame fills it in. Accepted behavior.
            if surface.resize_if_needed(side) {
                log_verbose!(
                    "FRAME",
                    "Surface resized to {0}x{0} (density {1})",
                    side,
                    frame.density
                );
            }

            let data = match inflate(&frame.compressed) {
                Ok(data) => data,
                Err(e) => {
                    log_warn!("FRAME", "Decompression failed, frame dropped: {}", e);
                    continue;
                }
            };

            let expected = frame.width() as usize * frame.height() as usize * 4;
            if data.len() != expected {
                log_warn!(
                    "FRAME",
                    "Pixel block is {} bytes, rectangle wants {}; frame dropped",
                    data.len(),
                    expected
                );
                continue;
            }

            let [y1, x1, _, _] = frame.rectangle;
            if !surface.blit(x1, y1, frame.width(), frame.height(), &data) {
                // Surface torn down while this frame was decoding.
                break;
            }

            frame_count += 1;
            if last_log.elapsed().as_secs() >= 10 {
                let fps = frame_count as f64 / start.elapsed().as_secs_f64();
                log_verbose!("FRAME", "{} frames, {:.1} fps avg", frame_count, fps);
                last_log = Instant::now();
            }
        }
        log_verbose!("FRAME", "Pipeline exiting");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SharedSurface;
    use crate::video::decoder::tests::{deflate, encode_frame};
    use crossbeam_channel::bounded;

    fn run_pipeline(payloads: Vec<Vec<u8>>) -> Arc<SharedSurface> {
        let surface = Arc::new(SharedSurface::new());
        let (tx, rx) = bounded(payloads.len().max(1));
        for payload in payloads {
            tx.send(payload).unwrap();
        }
        drop(tx);
        start_frame_pipeline(rx, surface.clone()).join().unwrap();
        surface
    }

    #[test]
    fn test_blits_partial_rectangle() {
        let block = vec![0xff; 20 * 20 * 4];
        let payload = encode_frame([10, 20, 30, 40], 1.0, &deflate(&block));
        let surface = run_pipeline(vec![payload]);

        let (side, pixels) = surface.snapshot().unwrap();
        assert_eq!(side, 240);
        let idx = |x: usize, y: usize| (y * side as usize + x) * 4;
        assert_eq!(pixels[idx(20, 10)], 0xff);
        assert_eq!(pixels[idx(39, 29)], 0xff);
        assert_eq!(pixels[idx(19, 10)], 0);
        assert_eq!(pixels[idx(40, 10)], 0);
        assert_eq!(pixels[idx(20, 9)], 0);
        assert_eq!(pixels[idx(20, 30)], 0);
    }

    #[test]
    fn test_density_change_resizes_and_clears() {
        let first = encode_frame([0, 0, 1, 1], 1.0, &deflate(&[0xff; 4]));
        let second = encode_frame([100, 100, 101, 101], 2.0, &deflate(&[0xaa; 4]));
        let surface = run_pipeline(vec![first, second]);

        let (side, pixels) = surface.snapshot().unwrap();
        assert_eq!(side, 480);
        // The 240-side blit at (0,0) was wiped by the resize.
        assert_eq!(pixels[0], 0);
        assert_eq!(pixels[(100 * 480 + 100) * 4], 0xaa);
    }

    #[test]
    fn test_bad_messages_do_not_stop_the_stream() {
        let garbage = vec![1u8, 2, 3];
        let corrupt = encode_frame([0, 0, 1, 1], 1.0, &[0xde, 0xad]);
        let wrong_size = encode_frame([0, 0, 2, 2], 1.0, &deflate(&[0u8; 4]));
        let good = encode_frame([0, 0, 1, 1], 1.0, &deflate(&[0x7f; 4]));
        let surface = run_pipeline(vec![garbage, corrupt, wrong_size, good]);

        let (_, pixels) = surface.snapshot().unwrap();
        assert_eq!(pixels[0], 0x7f);
    }

    #[test]
    fn test_closed_surface_skips_writes() {
        let surface = Arc::new(SharedSurface::new());
        surface.close();

        let (tx, rx) = bounded(1);
        tx.send(encode_frame([0, 0, 1, 1], 1.0, &deflate(&[0xff; 4])))
            .unwrap();
        drop(tx);
        start_frame_pipeline(rx, surface.clone()).join().unwrap();

        let (_, pixels) = surface.snapshot().unwrap();
        assert_eq!(pixels[0], 0);
    }
}
