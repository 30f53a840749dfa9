//! The step-by-step studio: concept, lyrics, arrangement, review.
//!
//! The wizard only holds state; generation happens on a worker through
//! `generate_lyric_options` and `compose_arrangement`, and the results are
//! handed back with the `set_*` methods.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::ai::AiClient;
use crate::error::{AiError, TaskError};
use crate::task::{ProgressController, Stage, TaskMode};

use super::draft::{Arrangement, DEFAULT_STYLE, SongDraft};
use super::snapshot::{SNAPSHOT_VERSION, Snapshot};

/// Number of lyric alternatives offered at the gate.
const LYRIC_OPTIONS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WizardStep {
    #[default]
    Concept,
    Lyrics,
    Arrangement,
    Review,
}

impl WizardStep {
    pub const ALL: [WizardStep; 4] = [
        WizardStep::Concept,
        WizardStep::Lyrics,
        WizardStep::Arrangement,
        WizardStep::Review,
    ];

    pub fn label(self) -> &'static str {
        match self {
            WizardStep::Concept => "Concept",
            WizardStep::Lyrics => "Lyrics",
            WizardStep::Arrangement => "Arrangement",
            WizardStep::Review => "Review",
        }
    }

    fn index(self) -> usize {
        self as usize
    }

    fn next(self) -> Option<Self> {
        Self::ALL.get(self.index() + 1).copied()
    }

    fn prev(self) -> Option<Self> {
        self.index().checked_sub(1).map(|i| Self::ALL[i])
    }
}

/// Inputs for the lyric alternatives call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LyricsRequest {
    pub concept: String,
    pub genre: String,
    pub mood: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Wizard {
    step: WizardStep,
    concept: String,
    genre: String,
    mood: String,
    lyric_options: Vec<String>,
    selected_lyrics: Option<usize>,
    arrangement: Option<Arrangement>,
}

impl Wizard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn concept(&self) -> &str {
        &self.concept
    }

    pub fn genre(&self) -> &str {
        &self.genre
    }

    pub fn mood(&self) -> &str {
        &self.mood
    }

    pub fn lyric_options(&self) -> &[String] {
        &self.lyric_options
    }

    pub fn selected_lyrics(&self) -> Option<usize> {
        self.selected_lyrics
    }

    pub fn arrangement(&self) -> Option<&Arrangement> {
        self.arrangement.as_ref()
    }

    pub fn set_concept(&mut self, concept: impl Into<String>) {
        self.concept = concept.into();
    }

    pub fn set_genre(&mut self, genre: impl Into<String>) {
        self.genre = genre.into();
    }

    pub fn set_mood(&mut self, mood: impl Into<String>) {
        self.mood = mood.into();
    }

    /// `None` while the concept is blank.
    pub fn lyrics_request(&self) -> Option<LyricsRequest> {
        let concept = self.concept.trim();
        if concept.is_empty() {
            return None;
        }
        Some(LyricsRequest {
            concept: concept.to_string(),
            genre: non_blank(&self.genre, DEFAULT_STYLE),
            mood: non_blank(&self.mood, "uplifting"),
        })
    }

    /// New alternatives replace the old ones and clear the selection.
    pub fn set_lyric_options(&mut self, options: Vec<String>) {
        self.lyric_options = options;
        self.selected_lyrics = None;
    }

    pub fn select_lyrics(&mut self, index: usize) -> bool {
        if index < self.lyric_options.len() {
            self.selected_lyrics = Some(index);
            true
        } else {
            false
        }
    }

    pub fn set_arrangement(&mut self, arrangement: Arrangement) {
        self.arrangement = Some(arrangement);
    }

    /// Why the wizard cannot move past the current step, if it cannot.
    pub fn blocked_reason(&self) -> Option<&'static str> {
        match self.step {
            WizardStep::Concept if self.concept.trim().is_empty() => {
                Some("Describe a concept first.")
            }
            WizardStep::Lyrics if self.lyric_options.is_empty() => {
                Some("Generate lyric options first.")
            }
            WizardStep::Lyrics if self.selected_lyrics.is_none() => {
                Some("Pick one of the lyric options.")
            }
            WizardStep::Arrangement if self.arrangement.is_none() => {
                Some("Compose an arrangement first.")
            }
            WizardStep::Review => Some("Already at the last step."),
            _ => None,
        }
    }

    pub fn advance(&mut self) -> bool {
        if let Some(reason) = self.blocked_reason() {
            debug!(step = ?self.step, reason, "wizard advance blocked");
            return false;
        }
        match self.step.next() {
            Some(next) => {
                self.step = next;
                true
            }
            None => false,
        }
    }

    pub fn back(&mut self) -> bool {
        match self.step.prev() {
            Some(prev) => {
                self.step = prev;
                true
            }
            None => false,
        }
    }

    /// Clear every field, but only if `confirm` agrees.
    pub fn reset(&mut self, confirm: impl FnOnce() -> bool) -> bool {
        if !confirm() {
            return false;
        }
        *self = Self::default();
        info!("wizard reset");
        true
    }

    /// The chosen lyrics plus arrangement, once both exist.
    pub fn draft(&self) -> Option<SongDraft> {
        let lyrics = self.lyric_options.get(self.selected_lyrics?)?;
        let arrangement = self.arrangement.as_ref()?;
        Some(SongDraft {
            title: arrangement.title.clone(),
            style: non_blank(&self.genre, DEFAULT_STYLE),
            lyrics: lyrics.clone(),
            bpm: arrangement.bpm,
            key: arrangement.key.clone(),
            cover: None,
        })
    }

    pub fn snapshot(&self) -> Snapshot {
        let arrangement = self.arrangement.clone().unwrap_or_default();
        Snapshot {
            version: SNAPSHOT_VERSION,
            step: self.step,
            concept: self.concept.clone(),
            genre: self.genre.clone(),
            mood: self.mood.clone(),
            lyric_options: self.lyric_options.clone(),
            selected_lyrics: self.selected_lyrics,
            composed: self.arrangement.is_some(),
            title: arrangement.title,
            bpm: arrangement.bpm,
            key: arrangement.key,
        }
    }

    /// Restore field by field. Values that no longer fit (a selection past
    /// the options, a step beyond a closed gate) are dropped rather than
    /// trusted.
    pub fn restore(&mut self, snapshot: &Snapshot) {
        let mut restored = Self::new();
        restored.concept = snapshot.concept.clone();
        restored.genre = snapshot.genre.clone();
        restored.mood = snapshot.mood.clone();
        restored.lyric_options = snapshot.lyric_options.clone();
        if let Some(i) = snapshot.selected_lyrics {
            if !restored.select_lyrics(i) {
                warn!(index = i, "dropping out-of-range lyric selection");
            }
        }
        if snapshot.composed {
            restored.arrangement = Some(Arrangement {
                title: snapshot.title.clone(),
                bpm: snapshot.bpm,
                key: snapshot.key.clone(),
            });
        }

        while restored.step != snapshot.step && restored.advance() {}
        if restored.step != snapshot.step {
            warn!(
                wanted = ?snapshot.step,
                restored = ?restored.step,
                "snapshot step not reachable, stopping earlier"
            );
        }
        *self = restored;
    }
}

fn non_blank(value: &str, fallback: &str) -> String {
    match value.trim() {
        "" => fallback.to_string(),
        v => v.to_string(),
    }
}

fn lyric_options_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "lyrics": {
                "type": "array",
                "minItems": LYRIC_OPTIONS,
                "maxItems": LYRIC_OPTIONS,
                "items": { "type": "string" }
            }
        }
    })
}

#[derive(Deserialize)]
struct LyricOptions {
    lyrics: Vec<String>,
}

/// Ask for lyric alternatives. A failed call yields no options, which keeps
/// the lyrics gate closed. `Ok(None)` means the user stopped the run.
pub fn generate_lyric_options(
    request: &LyricsRequest,
    client: &dyn AiClient,
    controller: &ProgressController,
) -> Result<Option<Vec<String>>, TaskError> {
    let stages = [Stage::millis("Writing lyric options", 1_200)];
    let prompt = format!(
        "Write {LYRIC_OPTIONS} alternative lyrics for a {} {} song about {}",
        request.mood, request.genre, request.concept
    );

    controller.run(&stages, TaskMode::Long, |ctx| {
        ctx.checkpoint()?;
        let parsed = client
            .generate_structured(&prompt, &lyric_options_schema())
            .and_then(|v| {
                serde_json::from_value::<LyricOptions>(v)
                    .map_err(|e| AiError::Malformed(e.to_string()))
            });
        let options: Vec<String> = match parsed {
            Ok(o) => o
                .lyrics
                .into_iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            Err(e) => {
                warn!(error = %e, "lyric options degraded to none");
                Vec::new()
            }
        };
        ctx.report(100.0, format!("{} options ready", options.len()));
        Ok(options)
    })
}

pub fn compose_arrangement(
    request: &LyricsRequest,
    lyrics: &str,
    client: &dyn AiClient,
    controller: &ProgressController,
) -> Result<Option<Arrangement>, TaskError> {
    let stages = [Stage::millis("Composing", 1_500)];
    let prompt = format!(
        "Arrange a {} {} song about {} with these lyrics:\n{lyrics}",
        request.mood, request.genre, request.concept
    );
    controller.run(&stages, TaskMode::Long, |ctx| {
        ctx.checkpoint()?;
        let arrangement = Arrangement::compose(client, &prompt);
        ctx.report(100.0, "Arrangement ready");
        Ok(arrangement)
    })
}
