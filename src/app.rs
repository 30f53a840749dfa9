//! Application module: exposes the app model used by the TUI and runtime.
//!
//! The `App` model lives in `app::model` and holds the active panel, the
//! text the user is typing, the wizard, the library listing and the results
//! coming back from worker threads.

mod model;

pub use model::*;
