//! Screenshot saving utility

use crate::{log_error, log_info};
use chrono::Local;
use image::{ImageBuffer, Rgba};

/// Save a snapshot of the mirror surface to a PNG on the Desktop.
pub fn save_screenshot(side: u32, rgba: Vec<u8>) {
    std::thread::spawn(move || {
        if rgba.is_empty() {
            log_error!("SNAPSHOT", "Surface empty, cannot save");
            return;
        }

        let timestamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
        let filename = format!("pod_mirror_{}.png", timestamp);

        let save_path = match dirs::desktop_dir() {
            Some(mut path) => {
                path.push(&filename);
                path
            }
            None => {
                log_info!("SNAPSHOT", "No Desktop dir, falling back to current dir");
                std::path::PathBuf::from(&filename)
            }
        };

        match ImageBuffer::<Rgba<u8>, _>::from_raw(side, side, rgba) {
            Some(buffer) => match buffer.save(&save_path) {
                Ok(_) => log_info!("SNAPSHOT", "Saved {0}x{0} to {1:?}", side, save_path),
                Err(e) => log_error!("SNAPSHOT", "Failed to save: {}", e),
            },
            None => log_error!("SNAPSHOT", "Pixel buffer does not match surface size"),
        }
    });
}
