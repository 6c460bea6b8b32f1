use crate::assemble::AssembledTrack;
use crate::playback::{PlaybackError, PlaybackSink};
use futures::future::BoxFuture;
use futures::FutureExt;

/// Discards the track. Stands in for a real sink in headless runs and tests.
#[derive(Clone, Debug, Default)]
pub struct DummyPlaybackSink;

impl DummyPlaybackSink {
    pub fn new() -> Self {
        Self
    }
}

impl PlaybackSink for DummyPlaybackSink {
    fn play(&self, track: AssembledTrack) -> BoxFuture<'_, Result<(), PlaybackError>> {
        async move {
            tracing::debug!(
                samples = track.samples.len(),
                duration_ms = track.duration().as_millis() as u64,
                "dummy sink dropped track"
            );
            Ok(())
        }
        .boxed()
    }
}
