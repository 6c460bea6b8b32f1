//! Canonical single-subchunk RIFF/WAVE serialization.
//!
//! The layout is byte-exact: 12-byte RIFF header, 24-byte `fmt ` chunk,
//! 8-byte `data` chunk header, then s16le samples. Total file length is
//! always `44 + samples * 2` bytes.

use crate::assemble::AssembledTrack;

pub const HEADER_LEN: usize = 44;
const BYTES_PER_SAMPLE: usize = 2;

/// Serializes the track into WAV file bytes. Infallible: every track has a
/// valid container.
pub fn encode(track: &AssembledTrack) -> Vec<u8> {
    let data_len = track.samples.len() * BYTES_PER_SAMPLE;
    let mut out = Vec::with_capacity(HEADER_LEN + data_len);

    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&((HEADER_LEN - 8 + data_len) as u32).to_le_bytes());
    out.extend_from_slice(b"WAVE");

    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes()); // fmt chunk size
    out.extend_from_slice(&1u16.to_le_bytes()); // PCM format tag
    out.extend_from_slice(&track.channels.to_le_bytes());
    out.extend_from_slice(&track.sample_rate_hz.to_le_bytes());
    let byte_rate = track.sample_rate_hz * u32::from(track.channels) * BYTES_PER_SAMPLE as u32;
    out.extend_from_slice(&byte_rate.to_le_bytes());
    out.extend_from_slice(&(track.channels * BYTES_PER_SAMPLE as u16).to_le_bytes());
    out.extend_from_slice(&16u16.to_le_bytes()); // bits per sample

    out.extend_from_slice(b"data");
    out.extend_from_slice(&(data_len as u32).to_le_bytes());
    for &sample in &track.samples {
        out.extend_from_slice(&sample_to_i16(sample).to_le_bytes());
    }

    out
}

/// Clamps to [-1, 1] and quantizes with the asymmetric scale that keeps the
/// representable range exactly [-32768, 32767]: negative samples scale by
/// 32768, non-negative by 32767, truncating toward zero.
fn sample_to_i16(sample: f32) -> i16 {
    let clamped = sample.clamp(-1.0, 1.0);
    let scaled = if clamped < 0.0 {
        clamped * 32768.0
    } else {
        clamped * 32767.0
    };
    scaled as i16
}
