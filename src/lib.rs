//! Time accounting for consulting work: a task ledger with a single-task
//! stopwatch, and the analytics derived from it.

pub mod aggregate;
pub mod calendar;
pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod heatmap;
pub mod models;
pub mod options;
pub mod report;
pub mod stopwatch;
pub mod store;
pub mod ticker;
pub mod tracker;

pub use aggregate::{Analytics, Grouped, Grouping};
pub use db::Database;
pub use error::TrackerError;
pub use heatmap::{Heatmap, HeatmapCell, Intensity};
pub use models::{AggregateRecord, NewTask, SkippedRecord, Summary, Task, TaskId, TaskPatch};
pub use options::{OptionSet, Options};
pub use stopwatch::{StartOutcome, Stopwatch, StopwatchState};
pub use store::TaskStore;
pub use tracker::Tracker;
