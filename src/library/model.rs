use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

/// Decoded PCM audio, interleaved `f32` samples.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioSamples {
    pub channels: u16,
    pub sample_rate: u32,
    pub data: Vec<f32>,
}

impl AudioSamples {
    pub fn new(channels: u16, sample_rate: u32, data: Vec<f32>) -> Self {
        Self {
            channels: channels.max(1),
            sample_rate: sample_rate.max(1),
            data,
        }
    }

    pub fn frames(&self) -> usize {
        self.data.len() / self.channels as usize
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.frames() as f64 / self.sample_rate as f64)
    }

    /// Frame index at playback position `at`, clamped to the end.
    pub fn frame_at(&self, at: Duration) -> usize {
        let frame = (at.as_secs_f64() * self.sample_rate as f64) as usize;
        frame.min(self.frames())
    }

    /// Mono mixdown of the `len` frames ending at `end_frame`, zero-padded at the start.
    pub fn mono_window(&self, end_frame: usize, len: usize) -> Vec<f32> {
        let channels = self.channels as usize;
        let end_frame = end_frame.min(self.frames());
        let mut out = vec![0.0; len];
        let start = end_frame.saturating_sub(len);
        let offset = len - (end_frame - start);
        for (slot, frame) in out[offset..].iter_mut().zip(start..end_frame) {
            let base = frame * channels;
            let sum: f32 = self.data[base..base + channels].iter().sum();
            *slot = sum / channels as f32;
        }
        out
    }
}

/// A playable unit. Tracks are immutable: new audio means a new `Track`.
#[derive(Debug, Clone)]
pub struct Track {
    pub id: Uuid,
    pub title: String,
    pub artist: Option<String>,
    audio: Arc<AudioSamples>,
}

impl Track {
    pub fn new(title: impl Into<String>, artist: Option<String>, audio: AudioSamples) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            artist,
            audio: Arc::new(audio),
        }
    }

    /// Same metadata, replacement audio, fresh identity.
    pub fn with_samples(&self, audio: AudioSamples) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: self.title.clone(),
            artist: self.artist.clone(),
            audio: Arc::new(audio),
        }
    }

    pub fn audio(&self) -> &Arc<AudioSamples> {
        &self.audio
    }

    pub fn duration(&self) -> Duration {
        self.audio.duration()
    }

    /// "Artist - Title", or just the title when the artist is blank.
    pub fn display(&self) -> String {
        make_display(&self.title, self.artist.as_deref())
    }
}

/// A file found by the library scan; decoded into a `Track` on demand.
#[derive(Debug, Clone)]
pub struct LibraryEntry {
    pub path: PathBuf,
    pub title: String,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub duration: Option<Duration>,
    pub display: String,
}

pub(crate) fn make_display(title: &str, artist: Option<&str>) -> String {
    match artist {
        Some(a) if !a.trim().is_empty() => format!("{} - {}", a.trim(), title),
        _ => title.to_string(),
    }
}
