use std::path::PathBuf;

use tracing::warn;

use crate::app::App;
use crate::config::{self, default_snapshot_path};
use crate::studio::{load_snapshot, save_snapshot};

pub fn snapshot_path(settings: &config::Settings) -> Option<PathBuf> {
    settings
        .studio
        .snapshot_path
        .clone()
        .or_else(default_snapshot_path)
}

/// Bring back the wizard from the last session. A rejected snapshot is
/// reported and ignored; the wizard starts fresh.
pub fn restore_studio(app: &mut App, settings: &config::Settings) {
    let Some(path) = snapshot_path(settings) else {
        return;
    };
    match load_snapshot(&path) {
        Ok(Some(snapshot)) => app.wizard.restore(&snapshot),
        Ok(None) => {}
        Err(e) => {
            warn!(path = %path.display(), error = %e, "ignoring studio snapshot");
            app.set_notice(format!("Studio snapshot ignored: {e}"));
        }
    }
}

pub fn save_studio(app: &App, settings: &config::Settings) {
    let Some(path) = snapshot_path(settings) else {
        return;
    };
    if let Err(e) = save_snapshot(&path, &app.wizard.snapshot()) {
        warn!(path = %path.display(), error = %e, "could not save studio snapshot");
    }
}
