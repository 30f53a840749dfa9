//! The seam between the playback engine and an audio device.

use std::time::Duration;

use rodio::{OutputStream, OutputStreamBuilder, Sink};

use crate::error::PlaybackError;
use crate::library::Track;

use super::sink::create_sink_at;

/// One scheduled playback of a track on the device.
pub trait Voice {
    /// Time played since this voice started, measured by the device.
    fn position(&self) -> Duration;
    fn stop(&mut self);
    /// True once the device has consumed every sample.
    fn is_finished(&self) -> bool;
}

/// An audio device able to schedule voices.
pub trait AudioOutput {
    type Voice: Voice;

    /// Whether the device is parked in a low-power state.
    fn is_suspended(&self) -> bool {
        false
    }

    fn resume(&mut self) -> Result<(), PlaybackError> {
        Ok(())
    }

    /// Start `track` at `offset`, playing immediately.
    fn start(&mut self, track: &Track, offset: Duration) -> Result<Self::Voice, PlaybackError>;
}

/// The default output device through `rodio`.
pub struct RodioOutput {
    stream: OutputStream,
}

impl RodioOutput {
    pub fn open_default() -> Result<Self, PlaybackError> {
        let mut stream = OutputStreamBuilder::open_default_stream()
            .map_err(|e| PlaybackError::NoOutput(e.to_string()))?;
        // rodio logs to stderr when OutputStream is dropped. That's useful in debugging,
        // but noisy for a TUI app.
        stream.log_on_drop(false);
        Ok(Self { stream })
    }
}

impl AudioOutput for RodioOutput {
    type Voice = RodioVoice;

    fn start(&mut self, track: &Track, offset: Duration) -> Result<RodioVoice, PlaybackError> {
        let sink = create_sink_at(&self.stream, track, offset);
        sink.play();
        Ok(RodioVoice { sink })
    }
}

pub struct RodioVoice {
    sink: Sink,
}

impl Voice for RodioVoice {
    fn position(&self) -> Duration {
        self.sink.get_pos()
    }

    fn stop(&mut self) {
        self.sink.stop();
    }

    fn is_finished(&self) -> bool {
        self.sink.empty()
    }
}
