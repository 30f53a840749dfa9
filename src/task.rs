//! Progress-tracked task execution.
//!
//! A `ProgressController` runs one unit of work at a time next to a progress
//! simulator that paces a status message and a 0-100 estimate through a list
//! of `Stage`s. Runs can be paused, resumed and stopped cooperatively from any
//! thread through the controller or a cloned `TaskHandle`.

mod controller;
mod simulator;
mod types;

pub use controller::{
    COMPLETE_MESSAGE, ERROR_MESSAGE, ProgressController, STOPPED_MESSAGE, TaskContext, TaskHandle,
};
pub use types::{ProgressSnapshot, Stage, TaskMode, TaskStatus};
