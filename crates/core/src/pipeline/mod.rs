//! Sequential narration pipeline: normalize, segment, synthesize each
//! segment in order, assemble the survivors, serialize the container.
//!
//! Per-segment failures are recorded and skipped; only an all-segments
//! failure (or an empty script) reaches the caller.

use crate::assemble::{self, AssembledTrack, SegmentResult};
use crate::config::{SegmentBudget, VoiceAssignment};
use crate::decode;
use crate::script::{self, Segment};
use crate::synth::{SpeechSynthesizer, SynthRequest};
use crate::wav;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("script contains no dialogue lines")]
    EmptyScript,

    #[error("synthesis failed: no segment produced audio")]
    SynthesisFailed,
}

/// Cooperative cancellation shared with the caller. Once set, the pipeline
/// stops issuing synthesis calls; segments already processed stay valid and
/// feed a best-effort track.
#[derive(Clone, Debug, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Clone, Debug, Default)]
pub struct PipelineConfig {
    pub voices: VoiceAssignment,
    pub segment_budget: SegmentBudget,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum SegmentStatus {
    Synthesized { samples: usize },
    Failed { reason: String },
    Skipped,
}

/// Per-segment outcome surfaced to the caller alongside the track.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SegmentReport {
    pub index: usize,
    pub chars: usize,
    pub status: SegmentStatus,
}

/// Everything one generation request produces: the in-memory track for
/// playback, the WAV bytes for download, and the per-segment report.
#[derive(Clone, Debug)]
pub struct Narration {
    pub track: AssembledTrack,
    pub wav: Vec<u8>,
    pub report: Vec<SegmentReport>,
}

pub struct NarrationPipeline<S> {
    synth: S,
    config: PipelineConfig,
}

impl<S> NarrationPipeline<S>
where
    S: SpeechSynthesizer,
{
    pub fn new(synth: S, config: PipelineConfig) -> Self {
        Self { synth, config }
    }

    pub async fn run(
        &self,
        raw_script: &str,
        cancel: &CancelFlag,
    ) -> Result<Narration, PipelineError> {
        let dialogue = script::normalize(raw_script);
        let segments = script::split_segments(&dialogue, self.config.segment_budget.get());
        if segments.is_empty() {
            return Err(PipelineError::EmptyScript);
        }
        tracing::info!(
            segments = segments.len(),
            chars = dialogue.chars().count(),
            "dialogue segmented"
        );

        let mut results: Vec<SegmentResult> = Vec::with_capacity(segments.len());
        let mut report = Vec::with_capacity(segments.len());

        for segment in &segments {
            if cancel.is_cancelled() {
                tracing::info!(index = segment.index, "cancelled, skipping remaining segments");
                report.push(SegmentReport {
                    index: segment.index,
                    chars: segment.char_len(),
                    status: SegmentStatus::Skipped,
                });
                continue;
            }

            match self.synthesize_segment(segment).await {
                Ok(buffer) => {
                    tracing::debug!(
                        index = segment.index,
                        samples = buffer.samples.len(),
                        duration_ms = buffer.duration().as_millis() as u64,
                        "segment decoded"
                    );
                    report.push(SegmentReport {
                        index: segment.index,
                        chars: segment.char_len(),
                        status: SegmentStatus::Synthesized {
                            samples: buffer.samples.len(),
                        },
                    });
                    results.push(Ok(buffer));
                }
                Err(e) => {
                    tracing::warn!(index = segment.index, error = %e, "segment failed, continuing");
                    report.push(SegmentReport {
                        index: segment.index,
                        chars: segment.char_len(),
                        status: SegmentStatus::Failed {
                            reason: e.to_string(),
                        },
                    });
                    results.push(Err(e));
                }
            }
        }

        let track =
            assemble::assemble(results).map_err(|_| PipelineError::SynthesisFailed)?;
        let wav = wav::encode(&track);
        tracing::info!(
            samples = track.samples.len(),
            duration_ms = track.duration().as_millis() as u64,
            wav_bytes = wav.len(),
            "track assembled"
        );

        Ok(Narration { track, wav, report })
    }

    async fn synthesize_segment(&self, segment: &Segment) -> SegmentResult {
        let request = SynthRequest {
            text: segment.text.clone(),
            voices: self.config.voices.as_map().clone(),
        };
        let payload = self.synth.synthesize(request).await?;
        Ok(decode::decode_payload(&payload)?)
    }
}
