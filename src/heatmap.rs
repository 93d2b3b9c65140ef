//! Spread tracked time over a day-of-week by hour-of-day grid.

use chrono::{Datelike, Timelike};
use serde::Serialize;
use tracing::debug;

use crate::calendar::parse_time_of_day;
use crate::models::{SkippedRecord, Task, TaskId};

pub const DAYS: usize = 7;
pub const HOURS: usize = 24;

/// Hours used for tasks without a recorded interval: 09:00 through 16:59
pub const WORKDAY_START_HOUR: usize = 9;
pub const WORKDAY_HOURS: usize = 8;

pub const DAY_NAMES: [&str; DAYS] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatmapCell {
    /// 0 = Sunday
    pub day_of_week: u8,
    pub hour_of_day: u8,
    pub accumulated_seconds: f64,
    pub contributing_tasks: Vec<TaskId>,
}

/// Display bucket of a cell relative to the busiest cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Intensity {
    None,
    VeryLow,
    Low,
    Medium,
    High,
    VeryHigh,
}

impl Intensity {
    pub fn from_ratio(ratio: f64) -> Self {
        if ratio <= 0.0 {
            Intensity::None
        } else if ratio < 0.2 {
            Intensity::VeryLow
        } else if ratio < 0.4 {
            Intensity::Low
        } else if ratio < 0.6 {
            Intensity::Medium
        } else if ratio < 0.8 {
            Intensity::High
        } else {
            Intensity::VeryHigh
        }
    }

    pub fn glyph(&self) -> char {
        match self {
            Intensity::None => '·',
            Intensity::VeryLow => '░',
            Intensity::Low => '▒',
            Intensity::Medium => '▓',
            Intensity::High => '█',
            Intensity::VeryHigh => '■',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Heatmap {
    /// `grid[day][hour]`
    pub grid: Vec<Vec<HeatmapCell>>,
    /// Largest cell value, the denominator for intensity
    pub max_value: f64,
    pub skipped: Vec<SkippedRecord>,
}

impl Heatmap {
    pub fn empty() -> Self {
        let grid = (0..DAYS)
            .map(|day| {
                (0..HOURS)
                    .map(|hour| HeatmapCell {
                        day_of_week: day as u8,
                        hour_of_day: hour as u8,
                        accumulated_seconds: 0.0,
                        contributing_tasks: Vec::new(),
                    })
                    .collect()
            })
            .collect();

        Self {
            grid,
            max_value: 0.0,
            skipped: Vec::new(),
        }
    }

    /// Build the grid from tasks with tracked time.
    ///
    /// A task with a start and end time is split evenly over the hours from its
    /// start hour up to (not including) its end hour, wrapping past midnight; a
    /// span of zero counts as one hour. Tasks without an interval are split over
    /// the standard workday.
    pub fn build<'a, I>(tasks: I) -> Self
    where
        I: IntoIterator<Item = &'a Task>,
    {
        let mut heatmap = Self::empty();

        for task in tasks {
            if task.time_spent == 0 {
                continue;
            }

            let Some(date) = task.parsed_date() else {
                debug!(task_id = task.id, date = %task.date, "heatmap skipping task");
                heatmap.skipped.push(SkippedRecord::unparseable_date(task));
                continue;
            };
            let day = date.weekday().num_days_from_sunday() as usize;

            let (first_hour, span) = hour_span(task).unwrap_or((WORKDAY_START_HOUR, WORKDAY_HOURS));
            let share = task.time_spent as f64 / span as f64;

            for offset in 0..span {
                let hour = (first_hour + offset) % HOURS;
                heatmap.add(day, hour, share, task.id);
            }
        }

        heatmap
    }

    fn add(&mut self, day: usize, hour: usize, seconds: f64, task_id: TaskId) {
        let cell = &mut self.grid[day][hour];
        cell.accumulated_seconds += seconds;
        cell.contributing_tasks.push(task_id);

        if cell.accumulated_seconds > self.max_value {
            self.max_value = cell.accumulated_seconds;
        }
    }

    pub fn cell(&self, day: usize, hour: usize) -> Option<&HeatmapCell> {
        self.grid.get(day).and_then(|row| row.get(hour))
    }

    pub fn cells(&self) -> impl Iterator<Item = &HeatmapCell> {
        self.grid.iter().flatten()
    }

    pub fn intensity(&self, cell: &HeatmapCell) -> Intensity {
        if self.max_value <= 0.0 {
            return Intensity::None;
        }
        Intensity::from_ratio(cell.accumulated_seconds / self.max_value)
    }
}

/// First hour and number of hour slots covered by the task's interval
fn hour_span(task: &Task) -> Option<(usize, usize)> {
    let (start, end) = task.interval()?;

    let (start, end) = match (parse_time_of_day(start), parse_time_of_day(end)) {
        (Ok(start), Ok(end)) => (start.hour() as usize, end.hour() as usize),
        _ => {
            debug!(task_id = task.id, "unreadable interval, using the standard workday");
            return None;
        }
    };

    let span = if end >= start {
        end - start
    } else {
        (HOURS - start) + end
    };

    Some((start, span.max(1)))
}
