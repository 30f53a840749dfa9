use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Top-level application settings loaded from `config.toml`.
///
/// File format: TOML
/// Default path (Linux/XDG): `$XDG_CONFIG_HOME/riffline/config.toml` or `~/.config/riffline/config.toml`
///
/// Precedence (highest wins):
/// 1) Environment variables (prefix `RIFFLINE__`, `__` as nested separator)
/// 2) Config file (if present)
/// 3) Struct defaults
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub task: TaskSettings,
    pub audio: AudioSettings,
    pub ai: AiSettings,
    pub studio: StudioSettings,
    pub library: LibrarySettings,
    pub ui: UiSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TaskSettings {
    /// Interval between progress simulator updates (milliseconds).
    pub tick_ms: u64,
    /// Polling interval while a task is paused (milliseconds).
    pub pause_poll_ms: u64,
    /// How long a terminal message stays visible before resetting to idle (milliseconds).
    pub settle_ms: u64,
}

impl TaskSettings {
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    pub fn pause_poll(&self) -> Duration {
        Duration::from_millis(self.pause_poll_ms)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

impl Default for TaskSettings {
    fn default() -> Self {
        Self {
            tick_ms: 50,
            pause_poll_ms: 200,
            settle_ms: 1500,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    /// Visualizer frame interval (milliseconds). ~16ms is one display refresh at 60Hz.
    pub frame_ms: u64,
    /// Number of frequency bins rendered as bars.
    pub visualizer_bars: usize,
    /// Analyser window size in samples. Must be a power of two.
    pub fft_size: usize,
}

impl AudioSettings {
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_ms)
    }
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            frame_ms: 16,
            visualizer_bars: 50,
            fft_size: 256,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AiProvider {
    /// No client; panels report the service as unavailable.
    #[serde(alias = "off", alias = "disabled")]
    None,
    /// Deterministic local stand-in client.
    #[serde(alias = "local")]
    Offline,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AiSettings {
    pub provider: AiProvider,
    /// Artificial latency per call for the offline client (milliseconds).
    pub latency_ms: u64,
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            provider: AiProvider::Offline,
            latency_ms: 400,
        }
    }
}

impl AiSettings {
    pub fn latency(&self) -> Duration {
        Duration::from_millis(self.latency_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StudioSettings {
    /// Where the wizard snapshot is stored. Defaults to the XDG data dir.
    pub snapshot_path: Option<PathBuf>,
    /// Length of rendered song previews (seconds).
    pub preview_seconds: u64,
}

impl Default for StudioSettings {
    fn default() -> Self {
        Self {
            snapshot_path: None,
            preview_seconds: 12,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LibrarySettings {
    /// File extensions to treat as audio (case-insensitive, without dot).
    pub extensions: Vec<String>,
    /// Whether to follow symlinks during scanning.
    pub follow_links: bool,
    /// Whether to include hidden files/directories (dotfiles).
    pub include_hidden: bool,
    /// Whether to recurse into subdirectories.
    pub recursive: bool,
    /// Optional cap on directory recursion depth.
    pub max_depth: Option<usize>,
}

impl Default for LibrarySettings {
    fn default() -> Self {
        Self {
            extensions: vec!["mp3".into(), "flac".into(), "wav".into(), "ogg".into()],
            follow_links: true,
            include_hidden: true,
            recursive: true,
            max_depth: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UiSettings {
    /// The text rendered inside the top header box.
    pub header_text: String,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            header_text: " ~ riffline studio ~ ".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default filter directive when `RUST_LOG` is unset.
    pub level: String,
    /// Log file. Defaults to `$XDG_STATE_HOME/riffline/riffline.log`.
    pub file: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}
