use std::fs::{self, OpenOptions};
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::config::{LoggingSettings, default_log_path};

/// Send `tracing` output to the log file; the terminal belongs to the TUI.
///
/// `RUST_LOG` wins over `logging.level`. Returns the file in use, or `None`
/// when no location could be determined.
pub fn init_logging(settings: &LoggingSettings) -> io::Result<Option<PathBuf>> {
    let Some(path) = settings.file.clone().or_else(default_log_path) else {
        return Ok(None);
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(&path)?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    // A subscriber may already be installed (tests); keep that one.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init();

    Ok(Some(path))
}
