//! Transport decoding of synthesis payloads.
//!
//! The service returns base64 over a signed 16-bit little-endian PCM stream
//! at a fixed 24 kHz mono format. Decoding happens per segment; a malformed
//! payload fails only its own segment.

use crate::config::{SYNTH_CHANNELS, SYNTH_SAMPLE_RATE_HZ};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const I16_SCALE: f32 = 1.0 / 32768.0;

/// Decoded samples for one segment, in [-1.0, 1.0].
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SampleBuffer {
    pub sample_rate_hz: u32,
    pub channels: u16,
    pub samples: Vec<f32>,
}

impl SampleBuffer {
    pub fn duration(&self) -> Duration {
        duration_from_samples(self.sample_rate_hz, self.samples.len())
    }
}

#[derive(thiserror::Error, Debug)]
pub enum DecodeError {
    #[error("invalid base64 payload: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    #[error("s16le byte length must be multiple of 2, got {0}")]
    MalformedPcmLength(usize),
}

pub type Result<T> = std::result::Result<T, DecodeError>;

/// Decodes the transport encoding to raw PCM bytes.
pub fn decode_transport(payload: &str) -> Result<Bytes> {
    Ok(Bytes::from(STANDARD.decode(payload)?))
}

/// Decodes a transport-encoded payload into a [`SampleBuffer`] at the
/// service's fixed format.
pub fn decode_payload(payload: &str) -> Result<SampleBuffer> {
    let raw = decode_transport(payload)?;
    let samples = parse_s16le(&raw)?;
    Ok(SampleBuffer {
        sample_rate_hz: SYNTH_SAMPLE_RATE_HZ,
        channels: SYNTH_CHANNELS,
        samples,
    })
}

fn parse_s16le(raw: &[u8]) -> Result<Vec<f32>> {
    if !raw.len().is_multiple_of(2usize) {
        return Err(DecodeError::MalformedPcmLength(raw.len()));
    }
    let mut out = Vec::with_capacity(raw.len() / 2);
    for chunk in raw.chunks_exact(2) {
        let sample = i16::from_le_bytes([chunk[0], chunk[1]]);
        out.push(f32::from(sample) * I16_SCALE);
    }
    Ok(out)
}

pub fn duration_from_samples(sample_rate_hz: u32, samples: usize) -> Duration {
    if sample_rate_hz == 0 {
        return Duration::from_secs(0);
    }
    let micros = (u128::from(samples as u64) * 1_000_000u128) / u128::from(sample_rate_hz);
    Duration::from_micros(micros.min(u128::from(u64::MAX)) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_i16le(samples: &[i16]) -> String {
        let mut raw = Vec::with_capacity(samples.len() * 2);
        for s in samples {
            raw.extend_from_slice(&s.to_le_bytes());
        }
        STANDARD.encode(raw)
    }

    #[test]
    fn decode_scales_by_32768() {
        let payload = encode_i16le(&[0, 16384, -16384, 32767, -32768]);
        let buffer = decode_payload(&payload).expect("valid payload");
        assert_eq!(buffer.sample_rate_hz, SYNTH_SAMPLE_RATE_HZ);
        assert_eq!(buffer.channels, SYNTH_CHANNELS);
        let expected = [0.0f32, 0.5, -0.5, 32767.0 / 32768.0, -1.0];
        assert_eq!(buffer.samples.len(), expected.len());
        for (got, want) in buffer.samples.iter().zip(expected.iter()) {
            assert!((got - want).abs() < 1e-6, "{got} != {want}");
        }
    }

    #[test]
    fn decode_rejects_odd_byte_length() {
        let payload = STANDARD.encode([0u8, 1, 2]);
        let err = decode_payload(&payload).unwrap_err();
        assert!(matches!(err, DecodeError::MalformedPcmLength(3)));
    }

    #[test]
    fn decode_rejects_invalid_base64() {
        let err = decode_payload("not base64!!!").unwrap_err();
        assert!(matches!(err, DecodeError::InvalidBase64(_)));
    }

    #[test]
    fn decode_empty_payload_is_empty_buffer() {
        let buffer = decode_payload("").expect("empty is valid transport");
        assert!(buffer.samples.is_empty());
    }

    #[test]
    fn duration_mono_24k() {
        assert_eq!(duration_from_samples(24_000, 24_000), Duration::from_secs(1));
        assert_eq!(duration_from_samples(0, 24_000), Duration::from_secs(0));
    }
}
