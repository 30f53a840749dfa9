//! Utilities for creating `rodio` sinks from `Track` values.
//!
//! The helper here copies the track's samples from the requested start
//! position into a buffer source and prepares a paused `Sink` for it.

use std::time::Duration;

use rodio::buffer::SamplesBuffer;
use rodio::{OutputStream, Sink};

use crate::library::Track;

/// Create a paused `Sink` for `track` that starts playback at `start_at`.
pub(super) fn create_sink_at(handle: &OutputStream, track: &Track, start_at: Duration) -> Sink {
    let audio = track.audio();
    let channels = audio.channels as usize;
    // Seek by slicing whole frames; `frame_at` clamps past-the-end offsets.
    let first = audio.frame_at(start_at) * channels;
    let source = SamplesBuffer::new(audio.channels, audio.sample_rate, audio.data[first..].to_vec());

    let sink = Sink::connect_new(handle.mixer());
    sink.append(source);
    sink.pause();
    sink
}
