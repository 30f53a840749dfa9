use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use crate::config::TaskSettings;
use crate::error::TaskError;

use super::simulator::simulate;
use super::types::{ProgressSnapshot, Shared, Stage, TaskMode, TaskStatus};

pub const COMPLETE_MESSAGE: &str = "Complete!";
pub const ERROR_MESSAGE: &str = "An error occurred.";
pub const STOPPED_MESSAGE: &str = "Task stopped by user.";

/// Runs one task at a time with a simulated progress display.
///
/// The controller is the only writer of the pause/stop flags; tasks observe them
/// through the `TaskContext` they are handed.
#[derive(Clone)]
pub struct ProgressController {
    shared: Arc<Shared>,
    settings: TaskSettings,
}

/// Cloneable remote control for a `ProgressController`, usable from other threads.
#[derive(Clone)]
pub struct TaskHandle {
    shared: Arc<Shared>,
}

/// What a running task sees of its controller.
pub struct TaskContext<'a> {
    shared: &'a Shared,
    poll: Duration,
}

impl ProgressController {
    pub fn new(settings: TaskSettings) -> Self {
        Self {
            shared: Arc::new(Shared::default()),
            settings,
        }
    }

    pub fn handle(&self) -> TaskHandle {
        TaskHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        self.handle().snapshot()
    }

    pub fn pause(&self) -> bool {
        self.handle().pause()
    }

    pub fn resume(&self) -> bool {
        self.handle().resume()
    }

    pub fn stop(&self) -> bool {
        self.handle().stop()
    }

    /// Run `task` on the calling thread while the simulator paces `stages`.
    ///
    /// Resolves to `Ok(Some(value))` on success and `Ok(None)` when the run was
    /// stopped, even if the task failed or finished afterwards. Rejects with
    /// `TaskError::Busy` while another run is active. A panicking task is
    /// reported as `TaskError::Failed` and leaves the controller usable.
    pub fn run<T, F>(
        &self,
        stages: &[Stage],
        mode: TaskMode,
        task: F,
    ) -> Result<Option<T>, TaskError>
    where
        F: FnOnce(&TaskContext<'_>) -> Result<T, TaskError>,
    {
        let generation = self.begin(stages)?;
        let started = Instant::now();
        info!(generation, stages = stages.len(), ?mode, "task started");

        let tick = self.settings.tick();
        let poll = self.settings.pause_poll();
        let ctx = TaskContext {
            shared: &self.shared,
            poll,
        };

        let outcome = thread::scope(|scope| {
            let simulator = scope.spawn(|| simulate(&self.shared, stages, mode, tick, poll));

            let outcome = panic::catch_unwind(AssertUnwindSafe(|| task(&ctx)))
                .unwrap_or_else(|payload| Err(TaskError::Failed(panic_message(payload))));

            // The task owns result delivery: in long mode, or once it has failed,
            // the simulator is cancelled instead of raced.
            if mode == TaskMode::Long || outcome.is_err() {
                let mut s = self.shared.lock();
                s.simulating = false;
                drop(s);
                self.shared.notify();
            }

            if simulator.join().is_err() {
                warn!(generation, "progress simulator panicked");
            }
            outcome
        });

        let result = self.finish(generation, outcome);
        debug!(
            generation,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "task finished"
        );
        self.schedule_settle(generation);
        result
    }

    fn begin(&self, stages: &[Stage]) -> Result<u64, TaskError> {
        let mut s = self.shared.lock();
        if s.active {
            warn!("rejected run: another task is in progress");
            return Err(TaskError::Busy);
        }
        s.generation += 1;
        s.active = true;
        s.paused = false;
        s.stopped = false;
        s.simulating = true;
        s.reported = false;
        s.status = TaskStatus::Running;
        s.progress = 0.0;
        s.message = stages.first().map(|st| st.label.clone()).unwrap_or_default();
        Ok(s.generation)
    }

    fn finish<T>(
        &self,
        generation: u64,
        outcome: Result<T, TaskError>,
    ) -> Result<Option<T>, TaskError> {
        let mut s = self.shared.lock();
        s.active = false;
        s.paused = false;
        s.simulating = false;

        if s.stopped || matches!(outcome, Err(TaskError::Stopped)) {
            s.status = TaskStatus::Stopped;
            s.message = STOPPED_MESSAGE.to_string();
            info!(generation, "task stopped by user");
            return Ok(None);
        }

        match outcome {
            Ok(value) => {
                s.status = TaskStatus::Completed;
                s.progress = 100.0;
                s.message = COMPLETE_MESSAGE.to_string();
                info!(generation, "task complete");
                Ok(Some(value))
            }
            Err(e) => {
                s.status = TaskStatus::Errored;
                s.message = ERROR_MESSAGE.to_string();
                error!(generation, error = %e, "task failed");
                Err(e)
            }
        }
    }

    /// Show the terminal message for the settle delay, then fall back to idle
    /// unless a newer run has started meanwhile.
    fn schedule_settle(&self, generation: u64) {
        let shared = Arc::clone(&self.shared);
        let settle = self.settings.settle();
        thread::spawn(move || {
            thread::sleep(settle);
            let mut s = shared.lock();
            if s.generation == generation && !s.active {
                s.status = TaskStatus::Idle;
                s.progress = 0.0;
                s.message.clear();
            }
        });
    }
}

impl TaskHandle {
    pub fn snapshot(&self) -> ProgressSnapshot {
        self.shared.snapshot()
    }

    pub fn pause(&self) -> bool {
        let mut s = self.shared.lock();
        if !s.active || s.stopped || s.paused {
            return false;
        }
        s.paused = true;
        s.status = TaskStatus::Paused;
        drop(s);
        self.shared.notify();
        debug!("task paused");
        true
    }

    pub fn resume(&self) -> bool {
        let mut s = self.shared.lock();
        if !s.active || s.stopped || !s.paused {
            return false;
        }
        s.paused = false;
        s.status = TaskStatus::Running;
        drop(s);
        self.shared.notify();
        debug!("task resumed");
        true
    }

    pub fn stop(&self) -> bool {
        let mut s = self.shared.lock();
        if !s.active || s.stopped {
            return false;
        }
        s.stopped = true;
        s.paused = false;
        s.status = TaskStatus::Stopped;
        s.message = STOPPED_MESSAGE.to_string();
        drop(s);
        self.shared.notify();
        info!("stop requested");
        true
    }
}

impl TaskContext<'_> {
    /// Cooperative checkpoint: blocks while paused, fails with
    /// `TaskError::Stopped` once the run was stopped.
    pub fn checkpoint(&self) -> Result<(), TaskError> {
        if self.shared.wait_while_paused(self.poll) {
            Ok(())
        } else {
            Err(TaskError::Stopped)
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.shared.lock().stopped
    }

    /// Sleep for `duration` of unpaused time, waking early on stop.
    pub fn sleep(&self, duration: Duration) -> Result<(), TaskError> {
        let mut remaining = duration;
        loop {
            self.checkpoint()?;
            if remaining.is_zero() {
                return Ok(());
            }
            let slice = remaining.min(self.poll);
            let started = Instant::now();
            self.shared.park_while(slice, |s| !s.paused && !s.stopped);
            remaining = remaining.saturating_sub(started.elapsed());
        }
    }

    /// Push real progress. Meant for `TaskMode::Long`, where nothing else moves the bar.
    ///
    /// Once a task has reported, its message takes precedence: the simulator
    /// stops replacing it with stage labels for the rest of the run.
    pub fn report(&self, progress: f32, message: impl Into<String>) {
        let mut s = self.shared.lock();
        if s.active && !s.stopped {
            s.progress = progress.clamp(0.0, 100.0);
            s.message = message.into();
            s.reported = true;
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    let detail = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown cause".to_string());
    format!("task panicked: {detail}")
}
