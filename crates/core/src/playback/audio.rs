use crate::assemble::AssembledTrack;
use crate::playback::{PlaybackError, PlaybackSink};
use futures::future::BoxFuture;
use futures::FutureExt;
use rodio::source::Source;
use rodio::{OutputStream, OutputStreamBuilder, Sink};
use std::sync::{Arc, Mutex};

/// Plays assembled tracks on the default output device.
///
/// [`rodio::OutputStream`] must stay alive while audio plays; opening a new
/// stream per track drops the previous one mid-playback and can truncate the
/// output. The stream is opened on first use and shared by all clones.
#[derive(Clone)]
pub struct AudioPlaybackSink {
    stream: Arc<Mutex<Option<OutputStream>>>,
}

impl AudioPlaybackSink {
    pub fn new() -> Self {
        Self {
            stream: Arc::new(Mutex::new(None)),
        }
    }

    fn connect_sink(&self) -> Result<Sink, PlaybackError> {
        let mut guard = match self.stream.lock() {
            Ok(g) => g,
            Err(poisoned) => {
                tracing::warn!("output stream cache lock was poisoned, recovering");
                poisoned.into_inner()
            }
        };

        if guard.is_none() {
            let stream = OutputStreamBuilder::open_default_stream().map_err(|e| {
                PlaybackError::AudioOutputUnavailable {
                    details: format!("open default output stream: {e}"),
                }
            })?;
            *guard = Some(stream);
        }

        let Some(stream) = guard.as_ref() else {
            return Err(PlaybackError::AudioOutputUnavailable {
                details: "internal error: stream cache empty after init".to_owned(),
            });
        };
        let mixer = stream.mixer();
        Ok(Sink::connect_new(&mixer))
    }
}

impl Default for AudioPlaybackSink {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackSink for AudioPlaybackSink {
    fn play(&self, track: AssembledTrack) -> BoxFuture<'_, Result<(), PlaybackError>> {
        async move {
            if track.sample_rate_hz == 0
                || track.channels == 0
                || track.samples.is_empty()
                || !track.samples.len().is_multiple_of(usize::from(track.channels))
            {
                tracing::warn!(
                    sample_rate_hz = track.sample_rate_hz,
                    channels = track.channels,
                    samples = track.samples.len(),
                    "skipping playback of empty/invalid track"
                );
                return Ok(());
            }

            let sink = self.connect_sink()?;
            let source = TrackSource::new(track.samples, track.sample_rate_hz, track.channels);

            sink.append(source);
            sink.sleep_until_end();

            Ok(())
        }
        .boxed()
    }
}

struct TrackSource {
    samples: std::vec::IntoIter<f32>,
    sample_rate: u32,
    channels: u16,
}

impl TrackSource {
    fn new(samples: Vec<f32>, sample_rate: u32, channels: u16) -> Self {
        Self {
            samples: samples.into_iter(),
            sample_rate,
            channels,
        }
    }
}

impl Iterator for TrackSource {
    type Item = f32;

    fn next(&mut self) -> Option<Self::Item> {
        self.samples.next()
    }
}

impl Source for TrackSource {
    fn current_span_len(&self) -> Option<usize> {
        None
    }

    fn channels(&self) -> u16 {
        self.channels
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn total_duration(&self) -> Option<std::time::Duration> {
        None
    }
}
