//! Audio playback: a single-session engine driven by a dedicated thread.
//!
//! `AudioPlayer` owns the thread and its command channel, `PlaybackEngine`
//! holds the session logic, and `AudioOutput` is the device seam.

mod analyser;
mod engine;
mod output;
mod player;
mod sink;
mod thread;
mod types;

pub use engine::PlaybackEngine;
pub use output::{AudioOutput, RodioOutput, Voice};
pub use player::AudioPlayer;
pub use types::*;

#[cfg(test)]
mod tests;
