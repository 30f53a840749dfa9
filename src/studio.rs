//! Panel logic for the studio: turning user input into AI requests run under
//! the progress controller, and the results into playable drafts.

mod chat;
mod draft;
mod quick_drop;
mod snapshot;
mod synth;
mod wizard;

pub use chat::{ChatReply, SentenceBuffer, drain_chat};
pub use draft::{Arrangement, FAILED_LYRICS, FAILED_TITLE, SongDraft};
pub use quick_drop::{DropRequest, QuickDrop};
pub use snapshot::{SNAPSHOT_VERSION, Snapshot, load_snapshot, save_snapshot};
pub use synth::{PREVIEW_SAMPLE_RATE, draft_track, render_preview, rerender_track};
pub use wizard::{LyricsRequest, Wizard, WizardStep, compose_arrangement, generate_lyric_options};

#[cfg(test)]
mod tests;
