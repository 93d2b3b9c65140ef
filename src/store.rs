use chrono::{Local, NaiveDate, Utc};
use tracing::{debug, warn};

use crate::calendar::parse_time_of_day;
use crate::db::Database;
use crate::error::{Result, TrackerError};
use crate::models::{NewTask, Task, TaskId, TaskPatch};

pub const TASKS_KEY: &str = "tasks";

/// In-memory task ledger with write-through persistence.
///
/// Every accepted mutation writes the whole collection to the `tasks` slot
/// before returning, so persisted snapshots follow mutation order.
pub struct TaskStore {
    db: Database,
    tasks: Vec<Task>,
    last_id: TaskId,
}

impl TaskStore {
    /// Load the persisted collection; unreadable state degrades to an empty store
    pub fn open(db: Database) -> Result<Self> {
        let tasks = match db.load_json::<Vec<Task>>(TASKS_KEY) {
            Ok(tasks) => tasks.unwrap_or_default(),
            Err(err @ TrackerError::MalformedPersistedState { .. }) => {
                warn!(error = %err, "starting with an empty task list");
                Vec::new()
            }
            Err(err) => return Err(err),
        };

        let last_id = tasks.iter().map(|t| t.id).max().unwrap_or(0);
        debug!(count = tasks.len(), "loaded tasks");

        Ok(Self { db, tasks, last_id })
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Tasks in insertion order
    pub fn list(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn create(&mut self, new: NewTask) -> Result<Task> {
        let title = require_title(&new.title)?;
        let start_time = clean_time(new.start_time)?;
        let end_time = clean_time(new.end_time)?;
        let date = new.date.unwrap_or_else(|| Local::now().date_naive());

        let task = Task {
            id: self.mint_id()?,
            title,
            category: new.category,
            system: new.system,
            task_type: new.task_type,
            description: clean_text(new.description),
            ticket_number: clean_text(new.ticket_number),
            project: clean_text(new.project),
            date: format_date(date),
            start_time,
            end_time,
            time_spent: 0,
            created: Utc::now(),
        };

        self.tasks.push(task.clone());
        if let Err(err) = self.persist() {
            self.tasks.pop();
            return Err(err);
        }
        debug!(id = task.id, title = %task.title, "created task");
        Ok(task)
    }

    pub fn update(&mut self, id: TaskId, patch: TaskPatch) -> Result<Task> {
        // Validate everything before touching the record
        let title = patch.title.as_deref().map(require_title).transpose()?;
        let start_time = patch.start_time.map(|t| clean_time(Some(t))).transpose()?;
        let end_time = patch.end_time.map(|t| clean_time(Some(t))).transpose()?;

        let index = self.index_of(id)?;
        let previous = self.tasks[index].clone();
        let task = &mut self.tasks[index];

        if let Some(title) = title {
            task.title = title;
        }
        if let Some(category) = patch.category {
            task.category = category;
        }
        if let Some(system) = patch.system {
            task.system = system;
        }
        if let Some(task_type) = patch.task_type {
            task.task_type = task_type;
        }
        if let Some(description) = patch.description {
            task.description = clean_text(Some(description));
        }
        if let Some(ticket_number) = patch.ticket_number {
            task.ticket_number = clean_text(Some(ticket_number));
        }
        if let Some(project) = patch.project {
            task.project = clean_text(Some(project));
        }
        if let Some(date) = patch.date {
            task.date = format_date(date);
        }
        if let Some(start_time) = start_time {
            task.start_time = start_time;
        }
        if let Some(end_time) = end_time {
            task.end_time = end_time;
        }
        if let Some(time_spent) = patch.time_spent {
            task.time_spent = time_spent;
        }

        let updated = task.clone();
        if let Err(err) = self.persist() {
            self.tasks[index] = previous;
            return Err(err);
        }
        Ok(updated)
    }

    /// Remove a task. Stopwatch bookkeeping is the caller's concern, see `Tracker::delete_task`.
    pub fn delete(&mut self, id: TaskId) -> Result<Task> {
        let index = self.index_of(id)?;

        let removed = self.tasks.remove(index);
        if let Err(err) = self.persist() {
            self.tasks.insert(index, removed);
            return Err(err);
        }
        debug!(id, "deleted task");
        Ok(removed)
    }

    fn index_of(&self, id: TaskId) -> Result<usize> {
        self.tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or(TrackerError::NotFound(id))
    }

    /// Failed writes leave the caller to restore the in-memory ledger
    fn persist(&self) -> Result<()> {
        self.db.save_json(TASKS_KEY, &self.tasks)
    }

    /// Millisecond timestamp, bumped past the last issued id when the clock repeats
    fn mint_id(&mut self) -> Result<TaskId> {
        let next = self
            .last_id
            .checked_add(1)
            .ok_or_else(|| TrackerError::Validation("task id space exhausted".to_string()))?;
        let now = u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0);
        let id = now.max(next);
        self.last_id = id;
        Ok(id)
    }
}

fn require_title(title: &str) -> Result<String> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(TrackerError::Validation("task title must not be empty".to_string()));
    }
    Ok(trimmed.to_string())
}

fn clean_text(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Empty clears the field; anything else must be `HH:MM`
fn clean_time(value: Option<String>) -> Result<Option<String>> {
    match clean_text(value) {
        Some(raw) => {
            let time = parse_time_of_day(&raw)?;
            Ok(Some(time.format("%H:%M").to_string()))
        }
        None => Ok(None),
    }
}

fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn new_task(title: &str) -> NewTask {
        NewTask {
            title: title.to_string(),
            category: "sap-ewm".to_string(),
            system: "dev".to_string(),
            task_type: "implementation".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 1, 15),
            ..Default::default()
        }
    }

    fn store() -> TaskStore {
        TaskStore::open(Database::open_in_memory().unwrap()).unwrap()
    }

    #[test]
    fn test_create_assigns_unique_ids() {
        let mut store = store();

        let a = store.create(new_task("Outbound delivery")).unwrap();
        let b = store.create(new_task("Wave template")).unwrap();

        assert_ne!(a.id, b.id);
        assert!(b.id > a.id);
        assert_eq!(a.time_spent, 0);
        assert_eq!(a.date, "2024-01-15");
        assert_eq!(store.list().len(), 2);
        assert_eq!(store.list()[0].title, "Outbound delivery");
    }

    #[test]
    fn test_create_rejects_blank_title() {
        let mut store = store();

        let err = store.create(new_task("   ")).unwrap_err();
        assert!(matches!(err, TrackerError::Validation(_)));
        assert!(store.list().is_empty());
    }

    #[test]
    fn test_create_rejects_malformed_time() {
        let mut store = store();
        let mut task = new_task("Call");
        task.start_time = Some("quarter past nine".to_string());

        assert!(matches!(store.create(task), Err(TrackerError::Validation(_))));
    }

    #[test]
    fn test_update_fields() {
        let mut store = store();
        let task = store.create(new_task("Draft")).unwrap();

        let updated = store
            .update(
                task.id,
                TaskPatch {
                    title: Some("Final".to_string()),
                    start_time: Some("9:05".to_string()),
                    time_spent: Some(120),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(updated.title, "Final");
        assert_eq!(updated.start_time.as_deref(), Some("09:05"));
        assert_eq!(updated.time_spent, 120);

        let cleared = store
            .update(
                task.id,
                TaskPatch {
                    start_time: Some(String::new()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(cleared.start_time, None);
    }

    #[test]
    fn test_update_and_delete_unknown_id() {
        let mut store = store();

        assert!(matches!(
            store.update(42, TaskPatch::default()),
            Err(TrackerError::NotFound(42))
        ));
        assert!(matches!(store.delete(42), Err(TrackerError::NotFound(42))));
    }

    #[test]
    fn test_mutations_are_persisted() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");

        let kept_id = {
            let mut store = TaskStore::open(Database::open(&db_path).unwrap()).unwrap();
            let kept = store.create(new_task("Keep")).unwrap();
            let dropped = store.create(new_task("Drop")).unwrap();
            store
                .update(kept.id, TaskPatch { time_spent: Some(900), ..Default::default() })
                .unwrap();
            store.delete(dropped.id).unwrap();
            kept.id
        };

        let store = TaskStore::open(Database::open(&db_path).unwrap()).unwrap();
        assert_eq!(store.list().len(), 1);
        assert_eq!(store.list()[0].id, kept_id);
        assert_eq!(store.list()[0].time_spent, 900);
    }

    #[test]
    fn test_malformed_state_falls_back_to_empty() {
        let db = Database::open_in_memory().unwrap();
        db.put(TASKS_KEY, "this is not json").unwrap();

        let mut store = TaskStore::open(db).unwrap();
        assert!(store.list().is_empty());

        // The store stays usable and overwrites the broken slot
        store.create(new_task("Fresh start")).unwrap();
        let raw = store.database().get(TASKS_KEY).unwrap().unwrap();
        assert!(raw.contains("Fresh start"));
    }

    #[test]
    fn test_failed_write_leaves_ledger_unchanged() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");

        let mut store = TaskStore::open(Database::open(&db_path).unwrap()).unwrap();
        let task = store.create(new_task("Saved")).unwrap();

        // Pull the table out from under the store so every write fails
        rusqlite::Connection::open(&db_path)
            .unwrap()
            .execute_batch("DROP TABLE kv")
            .unwrap();

        assert!(matches!(store.create(new_task("Ghost")), Err(TrackerError::Storage(_))));
        assert_eq!(store.list().len(), 1);

        let patch = TaskPatch { title: Some("Renamed".to_string()), time_spent: Some(60), ..Default::default() };
        assert!(store.update(task.id, patch).is_err());
        assert_eq!(store.get(task.id).unwrap().title, "Saved");
        assert_eq!(store.get(task.id).unwrap().time_spent, 0);

        assert!(store.delete(task.id).is_err());
        assert_eq!(store.list(), &[task]);
    }

    #[test]
    fn test_unchanged_state_serializes_identically() {
        let mut store = store();
        let task = store.create(new_task("Stable")).unwrap();
        store
            .update(task.id, TaskPatch { description: Some("Same bytes".to_string()), ..Default::default() })
            .unwrap();
        let before = store.database().get(TASKS_KEY).unwrap().unwrap();

        store.update(task.id, TaskPatch::default()).unwrap();
        let after = store.database().get(TASKS_KEY).unwrap().unwrap();

        assert_eq!(before, after);
    }

    #[test]
    fn test_id_minting_stops_at_max() {
        let db = Database::open_in_memory().unwrap();
        db.put(
            TASKS_KEY,
            &format!(
                r#"[{{"id":{},"title":"Edge","date":"2024-01-01","created":"2024-01-01T00:00:00Z"}}]"#,
                u64::MAX
            ),
        )
        .unwrap();

        let mut store = TaskStore::open(db).unwrap();
        assert!(matches!(store.create(new_task("After edge")), Err(TrackerError::Validation(_))));
        assert_eq!(store.list().len(), 1);
    }

    #[test]
    fn test_ids_stay_ahead_of_loaded_tasks() {
        let db = Database::open_in_memory().unwrap();
        let far_future = u64::MAX / 2;
        db.put(
            TASKS_KEY,
            &format!(
                r#"[{{"id":{},"title":"Imported","date":"2024-01-01","created":"2024-01-01T00:00:00Z"}}]"#,
                far_future
            ),
        )
        .unwrap();

        let mut store = TaskStore::open(db).unwrap();
        let task = store.create(new_task("Next")).unwrap();
        assert_eq!(task.id, far_future + 1);
    }
}
