mod remote;
mod retry;
mod tone;

use crate::config::VoiceId;
use futures::future::BoxFuture;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

pub use remote::RemoteSpeechClient;
pub use retry::RetryingSynthesizer;
pub use tone::ToneSpeechClient;

/// One synthesis call: a segment's text plus the full speaker-to-voice
/// assignment for the dialogue.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SynthRequest {
    pub text: String,
    pub voices: BTreeMap<String, VoiceId>,
}

#[derive(thiserror::Error, Debug)]
pub enum SynthError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("http error {0}: {1}")]
    HttpStatus(u16, String),

    #[error("synthesis response carried no audio payload")]
    EmptyPayload,

    #[error("invalid synthesis response: {0}")]
    InvalidResponse(String),
}

impl SynthError {
    /// Transport failures and server-side errors may succeed on a later
    /// attempt; a response without audio will not.
    pub fn is_retryable(&self) -> bool {
        match self {
            SynthError::Http(_) => true,
            SynthError::HttpStatus(status, _) => crate::util::is_http_retryable(*status),
            SynthError::EmptyPayload | SynthError::InvalidResponse(_) => false,
        }
    }
}

/// A handle to the external synthesis capability. Returns the service's
/// transport-encoded (base64) PCM payload; decoding is the next stage's job.
pub trait SpeechSynthesizer: Send + Sync {
    fn synthesize(&self, request: SynthRequest) -> BoxFuture<'_, Result<String, SynthError>>;
}

/// Shared handle over any synthesizer implementation. Lets the caller pick
/// an implementation at runtime while the pipeline stays generic.
#[derive(Clone)]
pub struct Synthesizer {
    inner: Arc<dyn SpeechSynthesizer>,
}

impl Synthesizer {
    pub fn new(inner: Arc<dyn SpeechSynthesizer>) -> Self {
        Self { inner }
    }
}

impl SpeechSynthesizer for Synthesizer {
    fn synthesize(&self, request: SynthRequest) -> BoxFuture<'_, Result<String, SynthError>> {
        let inner = Arc::clone(&self.inner);
        async move { inner.synthesize(request).await }.boxed()
    }
}
