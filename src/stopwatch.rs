//! Elapsed-time measurement for the single active task.
//!
//! Ticks accumulate in a transient counter owned by the stopwatch. Nothing
//! reaches the task's stored `time_spent` until [`Stopwatch::commit`] hands the
//! counter back to the caller, so pausing, switching or stopping without a
//! commit drops the unsaved seconds.

use serde::Serialize;

use crate::models::TaskId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StopwatchState {
    Idle,
    Running,
    Paused,
}

/// The task attached to the stopwatch and its uncommitted counter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ActiveTimer {
    pub task_id: TaskId,
    pub elapsed: u64,
    pub running: bool,
}

/// Result of [`Stopwatch::start`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// A new task became active, seeded from its saved time
    Started {
        task_id: TaskId,
        seeded_from: u64,
        /// The previously active task, with the seconds it never committed
        replaced: Option<ActiveTimer>,
    },
    Paused { task_id: TaskId, elapsed: u64 },
    Resumed { task_id: TaskId, elapsed: u64 },
}

#[derive(Debug, Default)]
pub struct Stopwatch {
    active: Option<ActiveTimer>,
}

impl Stopwatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> StopwatchState {
        match self.active {
            None => StopwatchState::Idle,
            Some(timer) if timer.running => StopwatchState::Running,
            Some(_) => StopwatchState::Paused,
        }
    }

    pub fn active(&self) -> Option<ActiveTimer> {
        self.active
    }

    pub fn active_task(&self) -> Option<TaskId> {
        self.active.map(|timer| timer.task_id)
    }

    pub fn is_running(&self) -> bool {
        self.state() == StopwatchState::Running
    }

    /// Toggle the active task, or make `task_id` active and running.
    ///
    /// `saved_seconds` is the task's stored `time_spent`; it is only read when
    /// the task is not already active.
    pub fn start(&mut self, task_id: TaskId, saved_seconds: u64) -> StartOutcome {
        if let Some(timer) = self.active.as_mut() {
            if timer.task_id == task_id {
                timer.running = !timer.running;
                return if timer.running {
                    StartOutcome::Resumed { task_id, elapsed: timer.elapsed }
                } else {
                    StartOutcome::Paused { task_id, elapsed: timer.elapsed }
                };
            }
        }

        let replaced = self.active.replace(ActiveTimer {
            task_id,
            elapsed: saved_seconds,
            running: true,
        });
        StartOutcome::Started {
            task_id,
            seeded_from: saved_seconds,
            replaced,
        }
    }

    /// Advance the counter by one second while running; returns the new value
    pub fn tick(&mut self) -> Option<u64> {
        match self.active.as_mut() {
            Some(timer) if timer.running => {
                timer.elapsed += 1;
                Some(timer.elapsed)
            }
            _ => None,
        }
    }

    /// The value to write into the active task's `time_spent`, if any task is active
    pub fn commit(&self) -> Option<(TaskId, u64)> {
        self.active.map(|timer| (timer.task_id, timer.elapsed))
    }

    /// Detach the active task without committing
    pub fn stop(&mut self) -> Option<ActiveTimer> {
        self.active.take()
    }

    /// Seconds to display for a task with the given saved time
    pub fn displayed_seconds(&self, task_id: TaskId, saved_seconds: u64) -> u64 {
        match self.active {
            Some(timer) if timer.task_id == task_id => timer.elapsed,
            _ => saved_seconds,
        }
    }
}
