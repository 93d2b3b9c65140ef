pub mod csv;
pub mod json;

use serde::Serialize;

use crate::calendar::{duration_between, format_elapsed};
use crate::models::{Task, TaskId};
use crate::options::Options;

/// A task as it appears in exports: option keys resolved to labels
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRecord {
    pub id: TaskId,
    pub title: String,
    pub category: String,
    pub system: String,
    pub task_type: String,
    pub description: String,
    pub ticket_number: String,
    pub project: String,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub duration: String,
    pub time_spent: u64,
    pub created: String,
}

/// Resolve tasks into export rows.
///
/// `date_format` is a chrono format string; dates that cannot be parsed are
/// passed through verbatim.
pub fn records<'a, I>(tasks: I, options: &Options, date_format: &str) -> Vec<ExportRecord>
where
    I: IntoIterator<Item = &'a Task>,
{
    tasks
        .into_iter()
        .map(|task| ExportRecord {
            id: task.id,
            title: task.title.clone(),
            category: options.categories.label(&task.category).to_string(),
            system: options.systems.label(&task.system).to_string(),
            task_type: options.task_types.label(&task.task_type).to_string(),
            description: task.description.clone().unwrap_or_default(),
            ticket_number: task.ticket_number.clone().unwrap_or_default(),
            project: task.project.clone().unwrap_or_default(),
            date: task
                .parsed_date()
                .map(|d| d.format(date_format).to_string())
                .unwrap_or_else(|| task.date.clone()),
            start_time: task.start_time.clone().unwrap_or_default(),
            end_time: task.end_time.clone().unwrap_or_default(),
            duration: task_duration(task),
            time_spent: task.time_spent,
            created: task.created.to_rfc3339(),
        })
        .collect()
}

/// Interval length when both ends are recorded, else the tracked time
pub fn task_duration(task: &Task) -> String {
    task.interval()
        .and_then(|(start, end)| duration_between(start, end).ok())
        .unwrap_or_else(|| format_elapsed(task.time_spent))
}
