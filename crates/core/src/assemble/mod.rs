//! Stitches per-segment synthesis results into one continuous track.
//!
//! Failures are per-segment and recoverable: a failed segment contributes
//! zero samples and simply vanishes from the output. Losing every segment is
//! the single pipeline-fatal condition.

use crate::decode::{duration_from_samples, DecodeError, SampleBuffer};
use crate::synth::SynthError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Why one segment produced no audio.
#[derive(thiserror::Error, Debug)]
pub enum SegmentError {
    #[error(transparent)]
    Synth(#[from] SynthError),

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// Outcome of synthesizing and decoding one segment, in sequence-index
/// order. Consumed exactly once by [`assemble`].
pub type SegmentResult = Result<SampleBuffer, SegmentError>;

#[derive(thiserror::Error, Debug)]
pub enum AssembleError {
    #[error("synthesis failed: no segment produced audio")]
    NoAudio,
}

/// The full ordered concatenation of all successfully synthesized audio for
/// one generation request.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct AssembledTrack {
    pub sample_rate_hz: u32,
    pub channels: u16,
    pub samples: Vec<f32>,
}

impl AssembledTrack {
    pub fn duration(&self) -> Duration {
        duration_from_samples(self.sample_rate_hz, self.samples.len())
    }
}

/// Concatenates the successfully decoded buffers in their given (sequence
/// index) order. No silence is inserted where a segment failed. Errors with
/// [`AssembleError::NoAudio`] when nothing decoded.
pub fn assemble(results: Vec<SegmentResult>) -> Result<AssembledTrack, AssembleError> {
    let mut format = None;
    let mut samples = Vec::new();

    for result in results {
        // Failures were already reported at the synthesis boundary.
        if let Ok(buffer) = result {
            format.get_or_insert((buffer.sample_rate_hz, buffer.channels));
            samples.extend(buffer.samples);
        }
    }

    let Some((sample_rate_hz, channels)) = format else {
        return Err(AssembleError::NoAudio);
    };

    Ok(AssembledTrack {
        sample_rate_hz,
        channels,
        samples,
    })
}
