//! Shared "now playing" context between the panels and the audio thread.
//!
//! Panels hand finished tracks to the deck; the deck remembers the current
//! track and forwards playback commands to the `AudioPlayer`.

use std::sync::Mutex;

use tracing::{debug, info, warn};

use crate::audio::{AudioCmd, AudioPlayer, PlaybackHandle};
use crate::library::Track;

pub struct Deck {
    player: AudioPlayer,
    current: Mutex<Option<Track>>,
}

impl Deck {
    pub fn new(player: AudioPlayer) -> Self {
        Self {
            player,
            current: Mutex::new(None),
        }
    }

    pub fn current_track(&self) -> Option<Track> {
        self.current.lock().ok().and_then(|t| t.clone())
    }

    /// Make `track` current and start it from the beginning, replacing
    /// whatever session was live.
    pub fn update_track(&self, track: Track) {
        info!(track = %track.display(), "deck track updated");
        if let Ok(mut current) = self.current.lock() {
            *current = Some(track.clone());
        }
        self.send(AudioCmd::Load(track));
    }

    /// As last published by the audio thread.
    pub fn is_playing(&self) -> bool {
        self.player
            .playback_handle()
            .lock()
            .map(|info| info.playing)
            .unwrap_or(false)
    }

    pub fn toggle_play(&self) {
        if self.current_track().is_none() {
            debug!("toggle ignored, no track on deck");
            return;
        }
        self.send(AudioCmd::TogglePlay);
    }

    pub fn stop(&self) {
        self.send(AudioCmd::Stop);
    }

    pub fn playback_handle(&self) -> PlaybackHandle {
        self.player.playback_handle()
    }

    /// Tear down playback and join the audio thread.
    pub fn shutdown(&self) {
        self.player.quit();
    }

    fn send(&self, cmd: AudioCmd) {
        if self.player.send(cmd).is_err() {
            warn!("audio thread is gone, command dropped");
        }
    }
}
