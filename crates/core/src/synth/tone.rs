use crate::config::SYNTH_SAMPLE_RATE_HZ;
use crate::synth::{SpeechSynthesizer, SynthError, SynthRequest};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::f32::consts::PI;

const BASE_FREQ_HZ: f32 = 440.0;
const MS_PER_CHAR: usize = 80;
const MIN_DURATION_MS: usize = 500;

/// Offline synthesizer producing a sine tone sized to the segment text.
///
/// Emits the same transport encoding as the real service (base64 over s16le
/// at 24 kHz mono), so the rest of the pipeline runs unchanged without
/// network access.
#[derive(Clone, Debug, Default)]
pub struct ToneSpeechClient;

impl ToneSpeechClient {
    pub fn new() -> Self {
        Self
    }
}

impl SpeechSynthesizer for ToneSpeechClient {
    fn synthesize(&self, request: SynthRequest) -> BoxFuture<'_, Result<String, SynthError>> {
        async move {
            let chars = request.text.chars().count();
            let duration_ms = (chars * MS_PER_CHAR).max(MIN_DURATION_MS);
            let sample_count = duration_ms * SYNTH_SAMPLE_RATE_HZ as usize / 1000;

            let mut raw = Vec::with_capacity(sample_count * 2);
            for i in 0..sample_count {
                let t = i as f32 / SYNTH_SAMPLE_RATE_HZ as f32;
                let amplitude = (2.0 * PI * BASE_FREQ_HZ * t).sin();
                let sample = (amplitude * f32::from(i16::MAX)) as i16;
                raw.extend_from_slice(&sample.to_le_bytes());
            }

            Ok(STANDARD.encode(raw))
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::decode_payload;
    use std::collections::BTreeMap;

    #[tokio::test]
    async fn tone_payload_decodes_at_protocol_format() {
        let client = ToneSpeechClient::new();
        let request = SynthRequest {
            text: "主持人：你好\n".to_owned(),
            voices: BTreeMap::new(),
        };
        let payload = client.synthesize(request).await.expect("tone synthesis");
        let buffer = decode_payload(&payload).expect("valid payload");
        assert_eq!(buffer.sample_rate_hz, SYNTH_SAMPLE_RATE_HZ);
        // 7 chars at 80 ms/char is below the 500 ms floor.
        assert_eq!(buffer.samples.len(), MIN_DURATION_MS * 24);
        assert!(buffer.samples.iter().all(|s| (-1.0..=1.0).contains(s)));
    }

    #[tokio::test]
    async fn tone_duration_tracks_text_length() {
        let client = ToneSpeechClient::new();
        let request = SynthRequest {
            text: "长".repeat(100),
            voices: BTreeMap::new(),
        };
        let payload = client.synthesize(request).await.expect("tone synthesis");
        let buffer = decode_payload(&payload).expect("valid payload");
        assert_eq!(buffer.samples.len(), 100 * MS_PER_CHAR * 24);
    }
}
