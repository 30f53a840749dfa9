use serde::Deserialize;
use serde_json::{Value, json};
use tracing::warn;

use crate::ai::AiClient;
use crate::error::AiError;

pub const FAILED_TITLE: &str = "Failed to generate title";
pub const FAILED_LYRICS: &str = "Failed to generate lyrics";

pub(crate) const DEFAULT_STYLE: &str = "pop";

const KEYS: &[&str] = &["C", "D", "E", "F", "G", "A", "Bb", "Am", "Em", "Dm"];

/// Tempo, key and title for a song, as returned by the composer call.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Arrangement {
    pub title: String,
    pub bpm: u32,
    pub key: String,
}

impl Default for Arrangement {
    fn default() -> Self {
        Self {
            title: FAILED_TITLE.to_string(),
            bpm: 100,
            key: "C".to_string(),
        }
    }
}

impl Arrangement {
    pub(crate) fn schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "title": { "type": "string" },
                "bpm": { "type": "integer", "minimum": 60, "maximum": 180 },
                "key": { "type": "string", "enum": KEYS },
            }
        })
    }

    /// Ask `client` for an arrangement; falls back to the default one.
    pub(crate) fn compose(client: &dyn AiClient, prompt: &str) -> Self {
        let parsed = client
            .generate_structured(prompt, &Self::schema())
            .and_then(|v| {
                serde_json::from_value::<Arrangement>(v)
                    .map_err(|e| AiError::Malformed(e.to_string()))
            });
        match parsed {
            Ok(a) if (20..=300).contains(&a.bpm) => a,
            Ok(a) => {
                warn!(bpm = a.bpm, "composer returned an unusable tempo");
                Self {
                    bpm: Self::default().bpm,
                    ..a
                }
            }
            Err(e) => {
                warn!(error = %e, "arrangement degraded to default");
                Self::default()
            }
        }
    }
}

/// A generated song, ready to preview.
#[derive(Debug, Clone, PartialEq)]
pub struct SongDraft {
    pub title: String,
    pub style: String,
    pub lyrics: String,
    pub bpm: u32,
    pub key: String,
    /// Encoded cover image, if one could be generated.
    pub cover: Option<Vec<u8>>,
}

/// Text result or the placeholder for a failed call.
pub(crate) fn text_or(result: Result<String, AiError>, placeholder: &str) -> String {
    match result {
        Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
        Ok(_) => {
            warn!(placeholder, "AI returned empty text");
            placeholder.to_string()
        }
        Err(e) => {
            warn!(error = %e, placeholder, "AI call degraded to placeholder");
            placeholder.to_string()
        }
    }
}
