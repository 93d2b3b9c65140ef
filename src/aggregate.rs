//! Grouped totals over a task selection.
//!
//! Every query recomputes from the tasks it is given; nothing is cached.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

use crate::calendar::{self, DateRange};
use crate::models::{AggregateRecord, SkippedRecord, Summary, Task};
use crate::options::{OptionSet, Options};

const SECONDS_PER_HOUR: f64 = 3600.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grouping {
    Category,
    TaskType,
    Day,
    Week,
    Month,
}

impl Grouping {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "category" | "categories" => Some(Grouping::Category),
            "type" | "task-type" | "types" => Some(Grouping::TaskType),
            "day" | "daily" => Some(Grouping::Day),
            "week" | "weekly" => Some(Grouping::Week),
            "month" | "monthly" => Some(Grouping::Month),
            _ => None,
        }
    }
}

/// Records for one grouping plus the tasks that could not be placed
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Grouped {
    pub records: Vec<AggregateRecord>,
    pub skipped: Vec<SkippedRecord>,
}

/// Round half away from zero to two decimals
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn seconds_to_hours(seconds: u64) -> f64 {
    round2(seconds as f64 / SECONDS_PER_HOUR)
}

pub fn summarize<'a, I>(tasks: I) -> Summary
where
    I: IntoIterator<Item = &'a Task>,
{
    let (count, seconds) = tasks
        .into_iter()
        .fold((0usize, 0u64), |(count, seconds), task| (count + 1, seconds + task.time_spent));

    let total_hours = seconds_to_hours(seconds);
    let avg_hours_per_task = if count == 0 {
        0.0
    } else {
        round2(seconds as f64 / count as f64 / SECONDS_PER_HOUR)
    };

    Summary {
        total_tasks: count,
        total_hours,
        avg_hours_per_task,
    }
}

/// Group tasks and total their tracked time.
///
/// Category and task-type records keep the order in which keys first appear;
/// day, week and month records ascend by key.
pub fn group<'a, I>(tasks: I, grouping: Grouping, options: &Options) -> Grouped
where
    I: IntoIterator<Item = &'a Task>,
{
    match grouping {
        Grouping::Category => group_by_slug(tasks, |t| t.category.as_str(), &options.categories),
        Grouping::TaskType => group_by_slug(tasks, |t| t.task_type.as_str(), &options.task_types),
        Grouping::Day => group_by_date(tasks, calendar::day_key, |_, key| key.to_string()),
        Grouping::Week => group_by_date(tasks, calendar::week_key, |date, _| {
            format!("Week {}", calendar::iso_week_number(date))
        }),
        Grouping::Month => group_by_date(tasks, calendar::month_key, |date, _| {
            date.format("%b %Y").to_string()
        }),
    }
}

fn group_by_slug<'a, I, F>(tasks: I, key_of: F, labels: &OptionSet) -> Grouped
where
    I: IntoIterator<Item = &'a Task>,
    F: Fn(&Task) -> &str,
{
    let mut order: Vec<String> = Vec::new();
    let mut totals: HashMap<String, (u64, usize)> = HashMap::new();

    for task in tasks {
        let key = key_of(task);
        let entry = totals.entry(key.to_string()).or_insert_with(|| {
            order.push(key.to_string());
            (0, 0)
        });
        entry.0 += task.time_spent;
        entry.1 += 1;
    }

    let records = order
        .into_iter()
        .map(|key| {
            let (seconds, count) = totals.get(&key).copied().unwrap_or_default();
            AggregateRecord {
                label: labels.label(&key).to_string(),
                group_key: key,
                total_hours: seconds_to_hours(seconds),
                task_count: count,
            }
        })
        .collect();

    Grouped {
        records,
        skipped: Vec::new(),
    }
}

fn group_by_date<'a, I, K, L>(tasks: I, key_of: K, label_of: L) -> Grouped
where
    I: IntoIterator<Item = &'a Task>,
    K: Fn(NaiveDate) -> String,
    L: Fn(NaiveDate, &str) -> String,
{
    let mut buckets: BTreeMap<String, (String, u64, usize)> = BTreeMap::new();
    let mut skipped = Vec::new();

    for task in tasks {
        let Some(date) = task.parsed_date() else {
            debug!(task_id = task.id, date = %task.date, "skipping task with unparseable date");
            skipped.push(SkippedRecord::unparseable_date(task));
            continue;
        };

        let key = key_of(date);
        let entry = buckets
            .entry(key.clone())
            .or_insert_with(|| (label_of(date, &key), 0, 0));
        entry.1 += task.time_spent;
        entry.2 += 1;
    }

    let records = buckets
        .into_iter()
        .map(|(key, (label, seconds, count))| AggregateRecord {
            group_key: key,
            label,
            total_hours: seconds_to_hours(seconds),
            task_count: count,
        })
        .collect();

    Grouped { records, skipped }
}

/// Tasks whose date falls inside `range`; unparseable dates are reported, not dropped silently
pub fn filter_by_date<'a, I>(tasks: I, range: &DateRange) -> (Vec<&'a Task>, Vec<SkippedRecord>)
where
    I: IntoIterator<Item = &'a Task>,
{
    let mut selected = Vec::new();
    let mut skipped = Vec::new();

    for task in tasks {
        match task.moment() {
            Some(moment) if range.contains(moment) => selected.push(task),
            Some(_) => {}
            None => skipped.push(SkippedRecord::unparseable_date(task)),
        }
    }

    (selected, skipped)
}

/// Every dashboard panel computed from one selection
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analytics {
    pub summary: Summary,
    pub by_category: Vec<AggregateRecord>,
    pub by_task_type: Vec<AggregateRecord>,
    pub daily: Vec<AggregateRecord>,
    pub weekly: Vec<AggregateRecord>,
    pub monthly: Vec<AggregateRecord>,
    pub skipped: Vec<SkippedRecord>,
}

impl Analytics {
    pub fn compute(tasks: &[&Task], options: &Options) -> Self {
        let by_category = group(tasks.iter().copied(), Grouping::Category, options);
        let by_task_type = group(tasks.iter().copied(), Grouping::TaskType, options);
        let daily = group(tasks.iter().copied(), Grouping::Day, options);
        let weekly = group(tasks.iter().copied(), Grouping::Week, options);
        let monthly = group(tasks.iter().copied(), Grouping::Month, options);

        // The three date groupings skip the same tasks
        let skipped = daily.skipped;

        Self {
            summary: summarize(tasks.iter().copied()),
            by_category: by_category.records,
            by_task_type: by_task_type.records,
            daily: daily.records,
            weekly: weekly.records,
            monthly: monthly.records,
            skipped,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn task(id: u64, category: &str, task_type: &str, date: &str, seconds: u64) -> Task {
        Task {
            id,
            title: format!("Task {}", id),
            category: category.to_string(),
            system: "dev".to_string(),
            task_type: task_type.to_string(),
            description: None,
            ticket_number: None,
            project: None,
            date: date.to_string(),
            start_time: None,
            end_time: None,
            time_spent: seconds,
            created: Utc::now(),
        }
    }

    fn sample() -> Vec<Task> {
        vec![
            task(1, "testing", "support", "2024-01-02", 5400),
            task(2, "sap-ewm", "implementation", "2024-01-01", 3600),
            task(3, "testing", "implementation", "2023-12-31", 1800),
            task(4, "sap-ewm", "support", "2024-02-10", 600),
        ]
    }

    #[test]
    fn test_empty_input() {
        let options = Options::default();
        let tasks: Vec<Task> = Vec::new();

        assert_eq!(
            summarize(&tasks),
            Summary { total_tasks: 0, total_hours: 0.0, avg_hours_per_task: 0.0 }
        );
        for grouping in [Grouping::Category, Grouping::TaskType, Grouping::Day, Grouping::Week, Grouping::Month] {
            assert_eq!(group(&tasks, grouping, &options), Grouped::default());
        }
    }

    #[test]
    fn test_summary() {
        let tasks = sample();
        let summary = summarize(&tasks);

        // 11400 s = 3.1666 h
        assert_eq!(summary.total_tasks, 4);
        assert_eq!(summary.total_hours, 3.17);
        assert_eq!(summary.avg_hours_per_task, 0.79);
    }

    #[test]
    fn test_average_uses_raw_seconds() {
        let tasks: Vec<Task> = (1..=4)
            .map(|id| task(id, "testing", "support", "2024-01-02", 15))
            .collect();
        let summary = summarize(&tasks);

        // 60 s rounds to 0.02 h, but 15 s per task is 0.0042 h
        assert_eq!(summary.total_hours, 0.02);
        assert_eq!(summary.avg_hours_per_task, 0.0);
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(0.125), 0.13);
        assert_eq!(round2(-0.125), -0.13);
        assert_eq!(round2(2.0), 2.0);
        assert_eq!(seconds_to_hours(1), 0.0);
        assert_eq!(seconds_to_hours(18), 0.01);
    }

    #[test]
    fn test_group_by_category_keeps_first_seen_order() {
        let tasks = sample();
        let grouped = group(&tasks, Grouping::Category, &Options::default());

        let keys: Vec<_> = grouped.records.iter().map(|r| r.group_key.as_str()).collect();
        assert_eq!(keys, ["testing", "sap-ewm"]);

        assert_eq!(grouped.records[0].label, "Testing");
        assert_eq!(grouped.records[0].total_hours, 2.0);
        assert_eq!(grouped.records[0].task_count, 2);
        assert_eq!(grouped.records[1].label, "SAP EWM");
        assert_eq!(grouped.records[1].total_hours, 1.17);
    }

    #[test]
    fn test_orphaned_category_uses_key_as_label() {
        let tasks = vec![task(1, "legacy-bw", "support", "2024-01-01", 3600)];
        let grouped = group(&tasks, Grouping::Category, &Options::default());

        assert_eq!(grouped.records[0].label, "legacy-bw");
    }

    #[test]
    fn test_group_by_week_uses_iso_weeks() {
        let tasks = sample();
        let grouped = group(&tasks, Grouping::Week, &Options::default());

        let keys: Vec<_> = grouped.records.iter().map(|r| r.group_key.as_str()).collect();
        assert_eq!(keys, ["2023-W52", "2024-W01", "2024-W06"]);
        assert_eq!(grouped.records[1].label, "Week 1");
        assert_eq!(grouped.records[1].total_hours, 2.5);
        assert_eq!(grouped.records[1].task_count, 2);
    }

    #[test]
    fn test_group_by_day_and_month_ascend() {
        let tasks = sample();
        let options = Options::default();

        let daily = group(&tasks, Grouping::Day, &options);
        let keys: Vec<_> = daily.records.iter().map(|r| r.group_key.as_str()).collect();
        assert_eq!(keys, ["2023-12-31", "2024-01-01", "2024-01-02", "2024-02-10"]);

        let monthly = group(&tasks, Grouping::Month, &options);
        let keys: Vec<_> = monthly.records.iter().map(|r| r.group_key.as_str()).collect();
        assert_eq!(keys, ["2023-12", "2024-01", "2024-02"]);
        assert_eq!(monthly.records[1].label, "Jan 2024");
        assert_eq!(monthly.records[1].total_hours, 2.5);
    }

    #[test]
    fn test_unparseable_date_is_skipped_and_reported() {
        let mut tasks = sample();
        tasks.push(task(9, "testing", "support", "31/01/2024", 7200));

        let grouped = group(&tasks, Grouping::Day, &Options::default());
        assert_eq!(grouped.records.len(), 4);
        assert_eq!(grouped.skipped.len(), 1);
        assert_eq!(grouped.skipped[0].task_id, 9);

        // Breakdowns that don't need the date still count it
        let by_category = group(&tasks, Grouping::Category, &Options::default());
        assert_eq!(by_category.records[0].task_count, 3);
    }

    #[test]
    fn test_filter_by_date() {
        let mut tasks = sample();
        tasks.push(task(9, "testing", "support", "garbage", 60));

        let range = DateRange::new(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 31),
        );
        let (selected, skipped) = filter_by_date(&tasks, &range);

        let ids: Vec<_> = selected.iter().map(|t| t.id).collect();
        assert_eq!(ids, [1, 2]);
        assert_eq!(skipped.len(), 1);
    }

    #[test]
    fn test_analytics_snapshot() {
        let tasks = sample();
        let refs: Vec<&Task> = tasks.iter().collect();
        let analytics = Analytics::compute(&refs, &Options::default());

        assert_eq!(analytics.summary.total_tasks, 4);
        assert_eq!(analytics.by_task_type.len(), 2);
        assert_eq!(analytics.daily.len(), 4);
        assert_eq!(analytics.weekly.len(), 3);
        assert_eq!(analytics.monthly.len(), 3);
        assert!(analytics.skipped.is_empty());
    }
}
