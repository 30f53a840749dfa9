//! Audio-related small types and handles.
//!
//! This module defines the commands accepted by the audio thread, the
//! playback info shared with the UI, and the events a session emits.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use uuid::Uuid;

use crate::library::Track;

/// Height of a visualizer bar with no signal.
pub const MIN_BAR_HEIGHT: f32 = 2.0;
/// Height added by a full-scale (255) frequency bin.
pub const BAR_RANGE: f32 = 20.0;

#[derive(Debug)]
pub enum AudioCmd {
    /// Replace the loaded track and start it from the beginning.
    Load(Track),
    /// Resume the loaded track at the paused offset.
    Play,
    /// Pause if playing, otherwise resume the loaded track.
    TogglePlay,
    /// Pause at the current position.
    Pause,
    /// Tear down the session and rewind the loaded track.
    Stop,
    /// Tear everything down and exit the audio thread.
    Quit,
}

/// Lifecycle notifications, one per session transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackEvent {
    Started {
        session: u64,
        track: Uuid,
        offset: Duration,
    },
    Paused {
        session: u64,
        at: Duration,
    },
    /// The track played to its end on its own.
    Ended { session: u64 },
    Stopped { session: u64 },
}

#[derive(Debug, Clone)]
/// Runtime playback information shared with the UI.
pub struct PlaybackInfo {
    pub track_id: Option<Uuid>,
    pub title: Option<String>,
    pub artist: Option<String>,
    /// Position within the loaded track, from the audio clock.
    pub elapsed: Duration,
    pub duration: Option<Duration>,
    /// Whether playback is currently active.
    pub playing: bool,
    /// Id of the live session, if any.
    pub session: Option<u64>,
    /// Visualizer bar heights.
    pub bars: Vec<f32>,
    /// Set when the audio output could not be opened.
    pub error: Option<String>,
}

impl Default for PlaybackInfo {
    fn default() -> Self {
        Self {
            track_id: None,
            title: None,
            artist: None,
            elapsed: Duration::ZERO,
            duration: None,
            playing: false,
            session: None,
            bars: Vec::new(),
            error: None,
        }
    }
}

pub type PlaybackHandle = Arc<Mutex<PlaybackInfo>>;
