use tracing::{debug, info, warn};

use crate::error::{Result, TrackerError};
use crate::models::{NewTask, Task, TaskId, TaskPatch};
use crate::stopwatch::{ActiveTimer, StartOutcome, Stopwatch};
use crate::store::TaskStore;

/// Task store plus the stopwatch attached to at most one of its tasks
pub struct Tracker {
    store: TaskStore,
    stopwatch: Stopwatch,
}

impl Tracker {
    pub fn new(store: TaskStore) -> Self {
        Self {
            store,
            stopwatch: Stopwatch::new(),
        }
    }

    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    pub fn stopwatch(&self) -> &Stopwatch {
        &self.stopwatch
    }

    pub fn tasks(&self) -> &[Task] {
        self.store.list()
    }

    pub fn task(&self, id: TaskId) -> Result<&Task> {
        self.store.get(id).ok_or(TrackerError::NotFound(id))
    }

    pub fn create_task(&mut self, new: NewTask) -> Result<Task> {
        self.store.create(new)
    }

    /// Edit fields. An edit to the active task does not touch its transient counter.
    pub fn update_task(&mut self, id: TaskId, patch: TaskPatch) -> Result<Task> {
        self.store.update(id, patch)
    }

    /// Delete a task, detaching the stopwatch first when it is the active one
    pub fn delete_task(&mut self, id: TaskId) -> Result<Task> {
        if self.store.get(id).is_none() {
            return Err(TrackerError::NotFound(id));
        }

        if self.stopwatch.active_task() == Some(id) {
            if let Some(timer) = self.stopwatch.stop() {
                warn!(
                    task_id = id,
                    unsaved = timer.elapsed,
                    "deleting the active task; stopwatch stopped"
                );
            }
        }

        self.store.delete(id)
    }

    /// Start, pause or resume the stopwatch for `id`
    pub fn toggle(&mut self, id: TaskId) -> Result<StartOutcome> {
        let saved = self.task(id)?.time_spent;
        let outcome = self.stopwatch.start(id, saved);

        if let StartOutcome::Started { replaced: Some(previous), .. } = outcome {
            let committed = self
                .store
                .get(previous.task_id)
                .map(|t| t.time_spent)
                .unwrap_or(0);
            if previous.elapsed != committed {
                info!(
                    task_id = previous.task_id,
                    discarded = previous.elapsed.saturating_sub(committed),
                    "switched task without saving"
                );
            }
        }

        debug!(?outcome, "stopwatch toggled");
        Ok(outcome)
    }

    pub fn tick(&mut self) -> Option<u64> {
        self.stopwatch.tick()
    }

    /// Write the transient counter into the active task; `Ok(None)` when nothing is active
    pub fn commit(&mut self) -> Result<Option<Task>> {
        let Some((id, elapsed)) = self.stopwatch.commit() else {
            return Ok(None);
        };

        let task = self.store.update(
            id,
            TaskPatch {
                time_spent: Some(elapsed),
                ..Default::default()
            },
        )?;
        info!(task_id = id, time_spent = elapsed, "saved tracked time");
        Ok(Some(task))
    }

    /// Detach the stopwatch without saving
    pub fn stop(&mut self) -> Option<ActiveTimer> {
        self.stopwatch.stop()
    }

    /// Seconds to show for a task: the live counter when active, else its saved time
    pub fn displayed_seconds(&self, id: TaskId) -> Result<u64> {
        let saved = self.task(id)?.time_spent;
        Ok(self.stopwatch.displayed_seconds(id, saved))
    }
}
