//! Versioned persistence of the studio wizard.
//!
//! The file is a flat TOML table. Loading is strict: any other version,
//! unknown key or missing key rejects the whole file.

use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::SnapshotError;

use super::wizard::WizardStep;

pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Snapshot {
    pub version: u32,
    pub step: WizardStep,
    pub concept: String,
    pub genre: String,
    pub mood: String,
    pub lyric_options: Vec<String>,
    /// Absent when no option was chosen.
    pub selected_lyrics: Option<usize>,
    /// Whether `title`, `bpm` and `key` hold a composed arrangement.
    pub composed: bool,
    pub title: String,
    pub bpm: u32,
    pub key: String,
}

/// Read only the version, so a future format is reported as such rather
/// than as a parse error.
#[derive(Deserialize)]
struct VersionHeader {
    version: u32,
}

impl Snapshot {
    pub fn from_toml(text: &str) -> Result<Self, SnapshotError> {
        let header: VersionHeader = toml::from_str(text)?;
        if header.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::Version {
                found: header.version,
                expected: SNAPSHOT_VERSION,
            });
        }
        Ok(toml::from_str(text)?)
    }

    pub fn to_toml(&self) -> Result<String, SnapshotError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// `Ok(None)` when no snapshot has been saved yet.
pub fn load_snapshot(path: &Path) -> Result<Option<Snapshot>, SnapshotError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no wizard snapshot");
            return Ok(None);
        }
        Err(e) => return Err(e.into()),
    };
    let snapshot = Snapshot::from_toml(&text)?;
    info!(path = %path.display(), "wizard snapshot loaded");
    Ok(Some(snapshot))
}

/// Written to a sibling temp file, then renamed into place.
pub fn save_snapshot(path: &Path, snapshot: &Snapshot) -> Result<(), SnapshotError> {
    let text = snapshot.to_toml()?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("toml.tmp");
    fs::write(&tmp, text)?;
    fs::rename(&tmp, path)?;
    debug!(path = %path.display(), "wizard snapshot saved");
    Ok(())
}
