use crate::synth::{SpeechSynthesizer, SynthError, SynthRequest};
use crate::util::{retry_with_backoff, RetryConfig};
use futures::future::BoxFuture;
use futures::FutureExt;

/// Decorator adding exponential-backoff retries around another synthesizer.
///
/// The baseline pipeline never retries a failed segment; wrapping the client
/// in this type is how a caller opts in.
#[derive(Clone)]
pub struct RetryingSynthesizer<S> {
    inner: S,
    config: RetryConfig,
}

impl<S> RetryingSynthesizer<S>
where
    S: SpeechSynthesizer,
{
    pub fn new(inner: S, config: RetryConfig) -> Self {
        Self { inner, config }
    }
}

impl<S> SpeechSynthesizer for RetryingSynthesizer<S>
where
    S: SpeechSynthesizer,
{
    fn synthesize(&self, request: SynthRequest) -> BoxFuture<'_, Result<String, SynthError>> {
        async move {
            retry_with_backoff(
                &self.config,
                || self.inner.synthesize(request.clone()),
                SynthError::is_retryable,
            )
            .await
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    /// Fails with the given error until `failures` attempts have been
    /// consumed, then succeeds.
    struct FlakySynthesizer {
        failures: u32,
        calls: Arc<AtomicU32>,
        error: fn() -> SynthError,
    }

    impl SpeechSynthesizer for FlakySynthesizer {
        fn synthesize(&self, _request: SynthRequest) -> BoxFuture<'_, Result<String, SynthError>> {
            let attempt = self.calls.fetch_add(1, Ordering::Relaxed) + 1;
            let failures = self.failures;
            let error = self.error;
            async move {
                if attempt <= failures {
                    Err(error())
                } else {
                    Ok("AAAA".to_owned())
                }
            }
            .boxed()
        }
    }

    fn request() -> SynthRequest {
        SynthRequest {
            text: "主持人：你好\n".to_owned(),
            voices: BTreeMap::new(),
        }
    }

    fn fast_config(max_attempts: u32) -> RetryConfig {
        RetryConfig::new(max_attempts, Duration::from_millis(1))
    }

    #[tokio::test]
    async fn retries_until_success() {
        let calls = Arc::new(AtomicU32::new(0));
        let synth = RetryingSynthesizer::new(
            FlakySynthesizer {
                failures: 2,
                calls: Arc::clone(&calls),
                error: || SynthError::HttpStatus(503, "busy".to_owned()),
            },
            fast_config(3),
        );

        let payload = synth.synthesize(request()).await.expect("third attempt");
        assert_eq!(payload, "AAAA");
        assert_eq!(calls.load(Ordering::Relaxed), 3);
    }

    #[tokio::test]
    async fn empty_payload_is_not_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let synth = RetryingSynthesizer::new(
            FlakySynthesizer {
                failures: 5,
                calls: Arc::clone(&calls),
                error: || SynthError::EmptyPayload,
            },
            fast_config(3),
        );

        let err = synth.synthesize(request()).await.unwrap_err();
        assert!(matches!(err, SynthError::EmptyPayload));
        assert_eq!(calls.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let calls = Arc::new(AtomicU32::new(0));
        let synth = RetryingSynthesizer::new(
            FlakySynthesizer {
                failures: 10,
                calls: Arc::clone(&calls),
                error: || SynthError::HttpStatus(500, "boom".to_owned()),
            },
            fast_config(2),
        );

        let err = synth.synthesize(request()).await.unwrap_err();
        assert!(matches!(err, SynthError::HttpStatus(500, _)));
        assert_eq!(calls.load(Ordering::Relaxed), 2);
    }
}
