//! WAV container synthesis
//!
//! The pod pushes raw PCM; playback goes through a standard decoder, so each
//! clip gets a canonical 44-byte RIFF/WAVE header prepended. All header
//! fields are little-endian.

/// Build a complete in-memory WAV file from raw PCM samples.
///
/// Layout: "RIFF", u32(36 + dataSize), "WAVE", "fmt ", u32(16), u16(1 = PCM),
/// u16(channels), u32(sampleRate), u32(byteRate), u16(blockAlign),
/// u16(bitsPerSample), "data", u32(dataSize), samples.
pub fn synthesize_wav(
    samples: &[u8],
    sample_rate: u32,
    channels: u16,
    bits_per_sample: u16,
) -> Vec<u8> {
    let block_align = channels * (bits_per_sample / 8);
    let byte_rate = sample_rate * block_align as u32;
    let data_size = samples.len() as u32;

    let mut wav = Vec::with_capacity(44 + samples.len());
    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&(36 + data_size).to_le_bytes());
    wav.extend_from_slice(b"WAVE");

    wav.extend_from_slice(b"fmt ");
    wav.extend_from_slice(&16u32.to_le_bytes());
    wav.extend_from_slice(&1u16.to_le_bytes());
    wav.extend_from_slice(&channels.to_le_bytes());
    wav.extend_from_slice(&sample_rate.to_le_bytes());
    wav.extend_from_slice(&byte_rate.to_le_bytes());
    wav.extend_from_slice(&block_align.to_le_bytes());
    wav.extend_from_slice(&bits_per_sample.to_le_bytes());

    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&data_size.to_le_bytes());
    wav.extend_from_slice(samples);
    wav
}
