use std::time::{Duration, Instant};

use tracing::trace;

use super::types::{Shared, Stage, TaskMode};

/// Walk `stages` in order, publishing the current label and (in simulated mode)
/// a time-based progress estimate. Paused time does not count as elapsed.
///
/// Returns when the stages are exhausted, the run is stopped, or the controller
/// cancels the simulation.
pub(super) fn simulate(
    shared: &Shared,
    stages: &[Stage],
    mode: TaskMode,
    tick: Duration,
    poll: Duration,
) {
    let total: Duration = stages.iter().map(|s| s.duration).sum();
    let mut active = Duration::ZERO;
    let mut last = Instant::now();
    let mut was_paused = false;
    let mut current_stage: Option<usize> = None;

    loop {
        {
            let mut s = shared.lock();
            if s.stopped || !s.simulating {
                return;
            }

            let now = Instant::now();
            if !was_paused {
                active += now - last;
            }
            last = now;

            if s.paused {
                was_paused = true;
                drop(s);
                shared.park_while(poll, |s| s.paused && !s.stopped && s.simulating);
                last = Instant::now();
                continue;
            }
            was_paused = false;

            let idx = stage_at(stages, active);
            if idx.is_some() && idx != current_stage {
                current_stage = idx;
                if let Some(stage) = idx.and_then(|i| stages.get(i)) {
                    trace!(stage = %stage.label, "progress stage");
                    if !s.reported {
                        s.message = stage.label.clone();
                    }
                }
            }

            if mode == TaskMode::Simulated {
                s.progress = percent(active, total);
            }

            if active >= total {
                return;
            }
        }

        let remaining = total.saturating_sub(active);
        shared.park_while(tick.min(remaining), |s| !s.paused && !s.stopped && s.simulating);
    }
}

/// Index of the stage that is current after `elapsed`; the last stage once all
/// durations have passed.
pub(super) fn stage_at(stages: &[Stage], elapsed: Duration) -> Option<usize> {
    if stages.is_empty() {
        return None;
    }
    let mut end = Duration::ZERO;
    for (i, stage) in stages.iter().enumerate() {
        end += stage.duration;
        if elapsed < end {
            return Some(i);
        }
    }
    Some(stages.len() - 1)
}

pub(super) fn percent(elapsed: Duration, total: Duration) -> f32 {
    if total.is_zero() {
        return 100.0;
    }
    (elapsed.as_secs_f32() / total.as_secs_f32() * 100.0).clamp(0.0, 100.0)
}
