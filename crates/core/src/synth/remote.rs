use crate::config::{ApiKey, VoiceId};
use crate::synth::{SpeechSynthesizer, SynthError, SynthRequest};
use futures::future::BoxFuture;
use futures::FutureExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// HTTP client for the multi-speaker synthesis service.
///
/// The surrounding application owns endpoint and credentials; this client
/// only speaks the request/response contract.
#[derive(Clone)]
pub struct RemoteSpeechClient {
    client: Client,
    endpoint: String,
    api_key: ApiKey,
}

impl RemoteSpeechClient {
    pub fn new<S: Into<String>>(endpoint: S, api_key: ApiKey) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
            api_key,
        }
    }
}

#[derive(Serialize)]
struct SpeechRequest {
    text: String,
    speaker_voices: Vec<SpeakerVoice>,
}

#[derive(Serialize)]
struct SpeakerVoice {
    speaker: String,
    voice: String,
}

#[derive(Deserialize)]
struct SpeechResponse {
    audio_payload: Option<String>,
}

fn wire_voices(voices: &BTreeMap<String, VoiceId>) -> Vec<SpeakerVoice> {
    voices
        .iter()
        .map(|(speaker, voice)| SpeakerVoice {
            speaker: speaker.clone(),
            voice: voice.as_str().to_owned(),
        })
        .collect()
}

impl SpeechSynthesizer for RemoteSpeechClient {
    fn synthesize(&self, request: SynthRequest) -> BoxFuture<'_, Result<String, SynthError>> {
        let this = self.clone();
        async move {
            let speech_request = SpeechRequest {
                speaker_voices: wire_voices(&request.voices),
                text: request.text,
            };

            let response = this
                .client
                .post(&this.endpoint)
                .header("Authorization", format!("Bearer {}", this.api_key.expose()))
                .json(&speech_request)
                .send()
                .await?;

            if !response.status().is_success() {
                let status = response.status().as_u16();
                let body = response.text().await.unwrap_or_default();
                return Err(SynthError::HttpStatus(status, body));
            }

            let speech_response: SpeechResponse = response
                .json()
                .await
                .map_err(|e| SynthError::InvalidResponse(e.to_string()))?;

            match speech_response.audio_payload {
                Some(payload) if !payload.is_empty() => Ok(payload),
                _ => Err(SynthError::EmptyPayload),
            }
        }
        .boxed()
    }
}
