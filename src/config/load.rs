use std::{env, path::PathBuf};

use super::schema::Settings;

/// Configuration loading helpers.
///
/// `Settings::load` tries environment variables first (prefix `RIFFLINE__`), then an
/// optional config file and falls back to struct defaults.
impl Settings {
    /// Load settings from environment and optional config file.
    pub fn load() -> Result<Self, ::config::ConfigError> {
        let config_path = resolve_config_path();

        let mut builder = ::config::Config::builder();

        if let Some(path) = &config_path {
            builder = builder.add_source(::config::File::from(path.as_path()).required(false));
        }

        builder = builder.add_source(
            ::config::Environment::with_prefix("RIFFLINE")
                .separator("__")
                .try_parsing(true),
        );

        let cfg = builder.build()?;
        let settings: Settings = cfg.try_deserialize()?;
        Ok(settings)
    }

    /// Perform basic validation checks on loaded settings.
    pub fn validate(&self) -> Result<(), String> {
        if self.task.tick_ms == 0 {
            return Err("task.tick_ms must be >= 1".to_string());
        }
        if self.task.pause_poll_ms == 0 {
            return Err("task.pause_poll_ms must be >= 1".to_string());
        }
        if self.audio.frame_ms == 0 {
            return Err("audio.frame_ms must be >= 1".to_string());
        }
        if self.audio.visualizer_bars == 0 {
            return Err("audio.visualizer_bars must be >= 1".to_string());
        }
        if !self.audio.fft_size.is_power_of_two() || self.audio.fft_size < 32 {
            return Err("audio.fft_size must be a power of two >= 32".to_string());
        }
        if self.audio.visualizer_bars > self.audio.fft_size / 2 {
            return Err("audio.visualizer_bars must not exceed fft_size / 2".to_string());
        }
        Ok(())
    }
}

/// Resolve the config path from `RIFFLINE_CONFIG_PATH` or XDG defaults.
pub fn resolve_config_path() -> Option<PathBuf> {
    if let Some(p) = env::var_os("RIFFLINE_CONFIG_PATH") {
        let p = PathBuf::from(p);
        return Some(p);
    }
    default_config_path()
}

/// Compute the default config path under `$XDG_CONFIG_HOME/riffline/config.toml`
/// or `~/.config/riffline/config.toml` when `XDG_CONFIG_HOME` is not set.
pub fn default_config_path() -> Option<PathBuf> {
    xdg_dir("XDG_CONFIG_HOME", ".config").map(|d| d.join("riffline").join("config.toml"))
}

/// Default wizard snapshot location: `$XDG_DATA_HOME/riffline/studio.toml`
/// or `~/.local/share/riffline/studio.toml`.
pub fn default_snapshot_path() -> Option<PathBuf> {
    xdg_dir("XDG_DATA_HOME", ".local/share").map(|d| d.join("riffline").join("studio.toml"))
}

/// Default log file: `$XDG_STATE_HOME/riffline/riffline.log`
/// or `~/.local/state/riffline/riffline.log`.
pub fn default_log_path() -> Option<PathBuf> {
    xdg_dir("XDG_STATE_HOME", ".local/state").map(|d| d.join("riffline").join("riffline.log"))
}

fn xdg_dir(var: &str, home_fallback: &str) -> Option<PathBuf> {
    if let Some(xdg) = env::var_os(var) {
        Some(PathBuf::from(xdg))
    } else {
        env::var_os("HOME").map(|home| PathBuf::from(home).join(home_fallback))
    }
}
