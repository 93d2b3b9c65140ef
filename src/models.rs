use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::calendar;

pub type TaskId = u64;

/// A logged unit of consulting work, stored in the browser-compatible layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub system: String,
    #[serde(default)]
    pub task_type: String,
    #[serde(default, deserialize_with = "empty_as_none", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none", skip_serializing_if = "Option::is_none")]
    pub ticket_number: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none", skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    /// ISO-8601 date or timestamp; kept verbatim so unparseable values survive a load
    pub date: String,
    #[serde(default, deserialize_with = "empty_as_none", skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none", skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    /// Tracked seconds, written on explicit save or edit
    #[serde(default)]
    pub time_spent: u64,
    pub created: DateTime<Utc>,
}

impl Task {
    pub fn parsed_date(&self) -> Option<NaiveDate> {
        calendar::parse_task_date(&self.date)
    }

    /// Local date-time of the task, used for range membership
    pub fn moment(&self) -> Option<NaiveDateTime> {
        calendar::parse_task_moment(&self.date)
    }

    /// Both ends of the work interval, when recorded
    pub fn interval(&self) -> Option<(&str, &str)> {
        match (self.start_time.as_deref(), self.end_time.as_deref()) {
            (Some(start), Some(end)) => Some((start, end)),
            _ => None,
        }
    }
}

/// Fields supplied when logging a new task
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub title: String,
    pub category: String,
    pub system: String,
    pub task_type: String,
    pub description: Option<String>,
    pub ticket_number: Option<String>,
    pub project: Option<String>,
    pub date: Option<NaiveDate>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

/// Partial update; `None` leaves a field untouched.
///
/// Empty strings clear the optional text and time fields.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub category: Option<String>,
    pub system: Option<String>,
    pub task_type: Option<String>,
    pub description: Option<String>,
    pub ticket_number: Option<String>,
    pub project: Option<String>,
    pub date: Option<NaiveDate>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub time_spent: Option<u64>,
}

/// A task left out of a date-dependent computation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedRecord {
    pub task_id: TaskId,
    pub title: String,
    pub reason: String,
}

impl SkippedRecord {
    pub fn unparseable_date(task: &Task) -> Self {
        Self {
            task_id: task.id,
            title: task.title.clone(),
            reason: format!("unparseable date '{}'", task.date),
        }
    }
}

/// One row of a grouped breakdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateRecord {
    pub group_key: String,
    pub label: String,
    pub total_hours: f64,
    pub task_count: usize,
}

/// Headline numbers over a task selection
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Summary {
    pub total_tasks: usize,
    pub total_hours: f64,
    pub avg_hours_per_task: f64,
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}
