//! Single-session playback with pause/resume and a visualizer feed.
//!
//! The engine owns at most one live session (a `Voice` plus its start offset).
//! Every transition tears the previous session down before a new one is
//! created, so a session can end, pause or stop at most once.

use std::sync::mpsc::Sender;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::AudioSettings;
use crate::error::PlaybackError;
use crate::library::Track;

use super::analyser::{Analyser, bar_height};
use super::output::{AudioOutput, Voice};
use super::types::{MIN_BAR_HEIGHT, PlaybackEvent, PlaybackInfo};

struct Session<V> {
    id: u64,
    voice: V,
    start_offset: Duration,
}

pub struct PlaybackEngine<O: AudioOutput> {
    output: O,
    analyser: Analyser,
    track: Option<Track>,
    session: Option<Session<O::Voice>>,
    paused_offset: Duration,
    elapsed: Duration,
    playing: bool,
    bars: Vec<f32>,
    /// Session the frame loop is armed for; `None` once cancelled.
    frame_loop: Option<u64>,
    next_session: u64,
    events: Option<Sender<PlaybackEvent>>,
}

impl<O: AudioOutput> PlaybackEngine<O> {
    pub fn new(output: O, settings: &AudioSettings) -> Self {
        Self {
            output,
            analyser: Analyser::new(settings.fft_size),
            track: None,
            session: None,
            paused_offset: Duration::ZERO,
            elapsed: Duration::ZERO,
            playing: false,
            bars: vec![MIN_BAR_HEIGHT; settings.visualizer_bars],
            frame_loop: None,
            next_session: 1,
            events: None,
        }
    }

    pub fn set_event_sink(&mut self, events: Sender<PlaybackEvent>) {
        self.events = Some(events);
    }

    pub fn track(&self) -> Option<&Track> {
        self.track.as_ref()
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn paused_offset(&self) -> Duration {
        self.paused_offset
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn bars(&self) -> &[f32] {
        &self.bars
    }

    pub fn session_id(&self) -> Option<u64> {
        self.session.as_ref().map(|s| s.id)
    }

    /// Whether the visualizer loop wants another frame.
    pub fn is_animating(&self) -> bool {
        self.frame_loop.is_some()
    }

    /// Replace the loaded track and play it from the beginning.
    pub fn load(&mut self, track: Track) -> Result<(), PlaybackError> {
        self.teardown();
        self.paused_offset = Duration::ZERO;
        self.play(track)
    }

    /// Play `track`, resuming at the paused offset when it is already loaded.
    pub fn play(&mut self, track: Track) -> Result<(), PlaybackError> {
        self.teardown();
        if self.track.as_ref().map(|t| t.id) != Some(track.id) {
            self.paused_offset = Duration::ZERO;
        }
        info!(track = %track.display(), "loading track");
        self.track = Some(track);
        self.start_session()
    }

    /// Play the loaded track at the paused offset. No-op while playing.
    pub fn resume(&mut self) -> Result<(), PlaybackError> {
        if self.playing {
            return Ok(());
        }
        self.start_session()
    }

    /// Pause if playing, otherwise play the loaded track. No-op without a track.
    pub fn toggle(&mut self) -> Result<(), PlaybackError> {
        if self.track.is_none() {
            return Ok(());
        }
        if self.playing {
            self.pause();
            Ok(())
        } else {
            self.resume()
        }
    }

    pub fn pause(&mut self) {
        if !self.playing {
            return;
        }
        let ended = self.teardown();
        self.playing = false;
        self.reset_bars();
        if let Some((session, at)) = ended {
            self.paused_offset = at;
            self.elapsed = at;
            debug!(session, at_ms = at.as_millis() as u64, "paused");
            self.emit(PlaybackEvent::Paused { session, at });
        }
    }

    /// Tear the session down and rewind; the track stays loaded.
    pub fn stop(&mut self) {
        let ended = self.teardown();
        self.playing = false;
        self.paused_offset = Duration::ZERO;
        self.elapsed = Duration::ZERO;
        self.reset_bars();
        if let Some((session, _)) = ended {
            debug!(session, "stopped");
            self.emit(PlaybackEvent::Stopped { session });
        }
    }

    /// One animation frame: detect natural end, sync elapsed from the audio
    /// clock and refresh the bars. Returns `false` once the loop is cancelled.
    pub fn frame(&mut self) -> bool {
        if self.frame_loop.is_none() {
            return false;
        }

        let (finished, position) = match self.session.as_ref() {
            Some(s) if Some(s.id) == self.frame_loop => {
                (s.voice.is_finished(), s.start_offset + s.voice.position())
            }
            _ => {
                self.frame_loop = None;
                return false;
            }
        };

        if finished {
            self.handle_ended();
            return false;
        }

        let Some(track) = self.track.as_ref() else {
            self.frame_loop = None;
            return false;
        };
        let audio = track.audio();
        self.elapsed = position.min(audio.duration());

        let window = audio.mono_window(audio.frame_at(self.elapsed), self.analyser.size());
        let data = self.analyser.byte_frequency_data(&window);
        for (bar, value) in self.bars.iter_mut().zip(data) {
            *bar = bar_height(value);
        }
        true
    }

    /// Tear down the session and cancel the frame loop for good.
    pub fn shutdown(&mut self) {
        self.teardown();
        self.playing = false;
        self.reset_bars();
    }

    pub fn info(&self) -> PlaybackInfo {
        let track = self.track();
        PlaybackInfo {
            track_id: track.map(|t| t.id),
            title: track.map(|t| t.title.clone()),
            artist: track.and_then(|t| t.artist.clone()),
            elapsed: self.elapsed(),
            duration: track.map(|t| t.duration()),
            playing: self.is_playing(),
            session: self.session_id(),
            bars: self.bars().to_vec(),
            error: None,
        }
    }

    fn start_session(&mut self) -> Result<(), PlaybackError> {
        let Some(track) = self.track.as_ref() else {
            return Ok(());
        };

        if self.output.is_suspended() {
            debug!("resuming suspended output before playback");
            self.output.resume()?;
        }

        let offset = if self.paused_offset() >= track.duration() {
            Duration::ZERO
        } else {
            self.paused_offset()
        };
        let voice = self.output.start(track, offset)?;
        let track_id = track.id;

        let id = self.next_session;
        self.next_session += 1;
        self.session = Some(Session {
            id,
            voice,
            start_offset: offset,
        });
        self.playing = true;
        self.elapsed = offset;
        self.frame_loop = Some(id);
        debug!(session = id, offset_ms = offset.as_millis() as u64, "session started");
        self.emit(PlaybackEvent::Started {
            session: id,
            track: track_id,
            offset,
        });
        Ok(())
    }

    /// Natural end of track: like pause, but the next play starts from zero.
    fn handle_ended(&mut self) {
        if !self.playing {
            return;
        }
        let ended = self.teardown();
        self.playing = false;
        self.paused_offset = Duration::ZERO;
        self.elapsed = Duration::ZERO;
        self.reset_bars();
        if let Some((session, _)) = ended {
            info!(session, "track ended");
            self.emit(PlaybackEvent::Ended { session });
        }
    }

    /// Stop and drop the live session, returning its id and final position.
    fn teardown(&mut self) -> Option<(u64, Duration)> {
        self.frame_loop = None;
        let mut session = self.session.take()?;
        let mut at = session.start_offset + session.voice.position();
        if let Some(track) = self.track.as_ref() {
            at = at.min(track.duration());
        }
        session.voice.stop();
        Some((session.id, at))
    }

    fn reset_bars(&mut self) {
        self.bars.iter_mut().for_each(|b| *b = MIN_BAR_HEIGHT);
    }

    fn emit(&self, event: PlaybackEvent) {
        if let Some(tx) = &self.events {
            if tx.send(event).is_err() {
                warn!("playback event receiver dropped");
            }
        }
    }
}

impl<O: AudioOutput> Drop for PlaybackEngine<O> {
    fn drop(&mut self) {
        self.teardown();
    }
}
