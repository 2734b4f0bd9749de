//! Audio module - PCM clip reconstruction and playback
//!
//! The pod pushes short raw-PCM clips; each one is wrapped in a WAV
//! container, decoded, and scheduled with a fixed lookahead.

mod playback;
mod wav;

pub use playback::{AudioOutput, PLAYBACK_LOOKAHEAD};
pub use wav::synthesize_wav;

use crate::{log_verbose, log_warn};
use anyhow::{bail, Result};
use crossbeam_channel::Receiver;
use std::thread::{self, JoinHandle};

/// One pushed audio clip, alive only for the duration of one
/// decode-and-schedule.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioClip {
    pub pcm: Vec<u8>,
    pub sample_rate: u32,
    pub bytes_per_sample: u16,
    pub channels: u16,
    pub volume: f32,
}

impl AudioClip {
    /// Parse one audio-clip message payload.
    ///
    /// Wire layout (big-endian): rate i32, width i32 (bytes per sample),
    /// channels i32, volume f32, then the raw PCM remainder.
    pub fn parse(payload: &[u8]) -> Result<Self> {
        if payload.len() < 16 {
            bail!("audio payload truncated: {} bytes", payload.len());
        }

        let rate = i32::from_be_bytes(payload[0..4].try_into()?);
        let width = i32::from_be_bytes(payload[4..8].try_into()?);
        let channels = i32::from_be_bytes(payload[8..12].try_into()?);
        let volume = f32::from_be_bytes(payload[12..16].try_into()?);

        if rate <= 0 {
            bail!("invalid sample rate {}", rate);
        }
        if !(1..=4).contains(&width) {
            bail!("invalid sample width {}", width);
        }
        if channels <= 0 {
            bail!("invalid channel count {}", channels);
        }

        Ok(Self {
            pcm: payload[16..].to_vec(),
            sample_rate: rate as u32,
            bytes_per_sample: width as u16,
            channels: channels as u16,
            volume,
        })
    }
}

/// Start the playback thread consuming audio-clip payloads.
///
/// The thread owns the output for the whole session. Bad clips are logged
/// and dropped; the stream keeps playing whatever comes next.
pub fn start_audio_pipeline(rx: Receiver<Vec<u8>>) -> JoinHandle<()> {
    thread::spawn(move || {
        let mut output = AudioOutput::new();

        while let Ok(payload) = rx.recv() {
            let clip = match AudioClip::parse(&payload) {
                Ok(clip) => clip,
                Err(e) => {
                    log_warn!("AUDIO", "Bad clip message: {}", e);
                    continue;
                }
            };
            output.schedule(clip);
        }
        log_verbose!("AUDIO", "Pipeline exiting");
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_clip(rate: i32, width: i32, channels: i32, volume: f32, pcm: &[u8]) -> Vec<u8> {
        let mut payload = Vec::new();
        payload.extend_from_slice(&rate.to_be_bytes());
        payload.extend_from_slice(&width.to_be_bytes());
        payload.extend_from_slice(&channels.to_be_bytes());
        payload.extend_from_slice(&volume.to_be_bytes());
        payload.extend_from_slice(pcm);
        payload
    }

    #[test]
    fn test_parse_clip() {
        let pcm = [1u8, 2, 3, 4];
        let clip = AudioClip::parse(&encode_clip(16000, 2, 1, 0.75, &pcm)).unwrap();
        assert_eq!(clip.sample_rate, 16000);
        assert_eq!(clip.bytes_per_sample, 2);
        assert_eq!(clip.channels, 1);
        assert_eq!(clip.volume, 0.75);
        assert_eq!(clip.pcm, pcm);
    }

    #[test]
    fn test_parse_empty_pcm_is_valid() {
        let clip = AudioClip::parse(&encode_clip(8000, 1, 2, 1.0, &[])).unwrap();
        assert!(clip.pcm.is_empty());
    }

    #[test]
    fn test_parse_rejects_truncated_payload() {
        assert!(AudioClip::parse(&[0u8; 15]).is_err());
    }

    #[test]
    fn test_parse_rejects_bad_fields() {
        assert!(AudioClip::parse(&encode_clip(0, 2, 1, 1.0, &[])).is_err());
        assert!(AudioClip::parse(&encode_clip(16000, 5, 1, 1.0, &[])).is_err());
        assert!(AudioClip::parse(&encode_clip(16000, 2, 0, 1.0, &[])).is_err());
    }
}
