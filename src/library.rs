//! Track model and the on-disk music library.
//!
//! `scan` finds audio files and reads their tags; `load_track` decodes one
//! into an in-memory `Track` the playback engine can own.

mod decode;
mod model;
mod scan;

pub use decode::load_track;
pub use model::{AudioSamples, LibraryEntry, Track};
pub use scan::scan;
