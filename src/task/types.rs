use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::Duration;

/// A labeled phase with an expected duration, used only for progress pacing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stage {
    pub label: String,
    pub duration: Duration,
}

impl Stage {
    pub fn new(label: impl Into<String>, duration: Duration) -> Self {
        Self {
            label: label.into(),
            duration,
        }
    }

    pub fn millis(label: impl Into<String>, ms: u64) -> Self {
        Self::new(label, Duration::from_millis(ms))
    }
}

/// How progress is driven during a run.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum TaskMode {
    /// Progress is interpolated from elapsed time over the stage durations.
    #[default]
    Simulated,
    /// Progress only moves when the task reports it; stage labels still cycle.
    Long,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum TaskStatus {
    #[default]
    Idle,
    Running,
    Paused,
    Stopped,
    Errored,
    Completed,
}

impl TaskStatus {
    pub fn is_active(self) -> bool {
        matches!(self, Self::Running | Self::Paused)
    }
}

/// Point-in-time view of a controller, safe to hand to the UI.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProgressSnapshot {
    pub status: TaskStatus,
    /// Progress estimate in percent, always within `0.0..=100.0`.
    pub progress: f32,
    pub message: String,
}

#[derive(Debug, Default)]
pub(super) struct TaskState {
    pub status: TaskStatus,
    pub progress: f32,
    pub message: String,
    /// Bumped on every accepted run; the settle timer compares against it.
    pub generation: u64,
    /// True from an accepted `run` until its outcome is recorded.
    pub active: bool,
    pub paused: bool,
    pub stopped: bool,
    /// Cleared when the simulator should exit early.
    pub simulating: bool,
    /// The task has called `report`; stage labels no longer overwrite its message.
    pub reported: bool,
}

/// State shared between the controller, its handles, the simulator and the task.
#[derive(Debug, Default)]
pub(super) struct Shared {
    state: Mutex<TaskState>,
    wake: Condvar,
}

impl Shared {
    pub fn lock(&self) -> MutexGuard<'_, TaskState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn notify(&self) {
        self.wake.notify_all();
    }

    /// Block for at most `timeout`, returning early once `keep_waiting` turns false.
    pub fn park_while<F>(&self, timeout: Duration, mut keep_waiting: F)
    where
        F: FnMut(&TaskState) -> bool,
    {
        let guard = self.lock();
        let _ = self
            .wake
            .wait_timeout_while(guard, timeout, |s| keep_waiting(s))
            .map_err(|e| e.into_inner());
    }

    /// Block while the run is paused. Returns `false` once the run is stopped.
    pub fn wait_while_paused(&self, poll: Duration) -> bool {
        let mut guard = self.lock();
        while guard.paused && !guard.stopped {
            guard = match self.wake.wait_timeout(guard, poll) {
                Ok((g, _)) => g,
                Err(e) => e.into_inner().0,
            };
        }
        !guard.stopped
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        let s = self.lock();
        ProgressSnapshot {
            status: s.status,
            progress: s.progress,
            message: s.message.clone(),
        }
    }
}
