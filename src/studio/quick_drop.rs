//! One-shot song generation from a short idea.

use tracing::{info, warn};

use crate::ai::AiClient;
use crate::error::TaskError;
use crate::task::{ProgressController, Stage, TaskMode};

use super::draft::{Arrangement, DEFAULT_STYLE, FAILED_LYRICS, FAILED_TITLE, SongDraft, text_or};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropRequest {
    pub idea: String,
    pub style: String,
}

impl DropRequest {
    /// `None` when the idea is blank: the generate action is simply disabled.
    pub fn new(idea: &str, style: &str) -> Option<Self> {
        let idea = idea.trim();
        if idea.is_empty() {
            return None;
        }
        let style = match style.trim() {
            "" => DEFAULT_STYLE,
            s => s,
        };
        Some(Self {
            idea: idea.to_string(),
            style: style.to_string(),
        })
    }

    fn title_prompt(&self) -> String {
        format!("Song title for: {} (style: {})", self.idea, self.style)
    }

    fn lyrics_prompt(&self) -> String {
        format!("Write lyrics for a {} song about {}", self.style, self.idea)
    }

    fn arrangement_prompt(&self) -> String {
        format!("Arrange a {} song about {}", self.style, self.idea)
    }

    fn cover_prompt(&self, title: &str) -> String {
        format!("Album cover for \"{title}\", a {} song", self.style)
    }
}

pub struct QuickDrop {
    stages: Vec<Stage>,
}

impl Default for QuickDrop {
    fn default() -> Self {
        Self::with_stages(vec![
            Stage::millis("Writing lyrics", 1_500),
            Stage::millis("Composing", 1_500),
            Stage::millis("Designing cover", 1_000),
        ])
    }
}

impl QuickDrop {
    pub fn with_stages(stages: Vec<Stage>) -> Self {
        Self { stages }
    }

    /// Generate a full draft under `controller`. Individual AI failures
    /// degrade to placeholders; `Ok(None)` means the user stopped the run.
    pub fn generate(
        &self,
        request: &DropRequest,
        client: &dyn AiClient,
        controller: &ProgressController,
    ) -> Result<Option<SongDraft>, TaskError> {
        info!(idea = %request.idea, style = %request.style, "quick drop requested");

        controller.run(&self.stages, TaskMode::Simulated, |ctx| {
            ctx.checkpoint()?;
            let title = text_or(client.generate_text(&request.title_prompt()), FAILED_TITLE);

            ctx.checkpoint()?;
            let lyrics = text_or(client.generate_text(&request.lyrics_prompt()), FAILED_LYRICS);

            ctx.checkpoint()?;
            let arrangement = Arrangement::compose(client, &request.arrangement_prompt());

            ctx.checkpoint()?;
            let cover = match client.generate_image(&request.cover_prompt(&title)) {
                Ok(bytes) if !bytes.is_empty() => Some(bytes),
                Ok(_) => None,
                Err(e) => {
                    warn!(error = %e, "cover art degraded to none");
                    None
                }
            };

            Ok(SongDraft {
                title,
                style: request.style.clone(),
                lyrics,
                bpm: arrangement.bpm,
                key: arrangement.key,
                cover,
            })
        })
    }
}
