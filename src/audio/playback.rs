//! Audio clip scheduling
//!
//! Each clip is reconstructed into a WAV container, decoded, and played on
//! its own one-shot graph (source -> gain -> output). Clips overlap freely;
//! there is no queue and no mixing limit.

use crate::audio::wav::synthesize_wav;
use crate::audio::AudioClip;
use crate::{log_verbose, log_warn};
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};
use std::io::Cursor;
use std::time::Duration;

/// Fixed scheduling lookahead absorbing decode jitter. Not adaptive.
pub const PLAYBACK_LOOKAHEAD: Duration = Duration::from_millis(100);

/// The process-wide audio output.
///
/// Opened lazily on the first clip and kept for the session's lifetime.
/// `resume` re-attempts the open opportunistically when the device was not
/// available earlier; a clip arriving while the output stays unavailable is
/// dropped silently.
pub struct AudioOutput {
    output: Option<(OutputStream, OutputStreamHandle)>,
}

impl AudioOutput {
    pub fn new() -> Self {
        Self { output: None }
    }

    fn resume(&mut self) -> Option<&OutputStreamHandle> {
        if self.output.is_none() {
            match OutputStream::try_default() {
                Ok(pair) => {
                    log_verbose!("AUDIO", "Output device opened");
                    self.output = Some(pair);
                }
                Err(e) => {
                    log_verbose!("AUDIO", "Output device unavailable: {}", e);
                }
            }
        }
        self.output.as_ref().map(|(_, handle)| handle)
    }

    /// Decode and schedule one clip at now + the fixed lookahead.
    pub fn schedule(&mut self, clip: AudioClip) {
        let wav = synthesize_wav(
            &clip.pcm,
            clip.sample_rate,
            clip.channels,
            clip.bytes_per_sample * 8,
        );

        let Some(handle) = self.resume() else {
            return;
        };

        let source = match Decoder::new(Cursor::new(wav)) {
            Ok(source) => source,
            Err(e) => {
                log_warn!("AUDIO", "Undecodable clip dropped: {}", e);
                return;
            }
        };

        let sink = match Sink::try_new(handle) {
            Ok(sink) => sink,
            Err(e) => {
                log_verbose!("AUDIO", "Playback graph failed: {}", e);
                return;
            }
        };
        sink.set_volume(clip.volume);
        sink.append(source.delay(PLAYBACK_LOOKAHEAD));
        // Detached sinks keep playing on their own, so concurrent clips
        // overlap instead of queueing.
        sink.detach();
    }
}

impl Default for AudioOutput {
    fn default() -> Self {
        Self::new()
    }
}
