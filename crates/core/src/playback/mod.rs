mod audio;
mod dummy;

use crate::assemble::AssembledTrack;
use futures::future::BoxFuture;

pub use audio::AudioPlaybackSink;
pub use dummy::DummyPlaybackSink;

#[derive(thiserror::Error, Debug)]
pub enum PlaybackError {
    #[error("audio output unavailable: {details}")]
    AudioOutputUnavailable { details: String },
}

/// Consumer of the assembled track. The pipeline produces the track; what
/// plays it is the caller's choice.
pub trait PlaybackSink: Send + Sync {
    fn play(&self, track: AssembledTrack) -> BoxFuture<'_, Result<(), PlaybackError>>;
}
