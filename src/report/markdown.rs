use crate::aggregate::Analytics;
use crate::calendar::{format_elapsed, DateRange};
use crate::heatmap::{Heatmap, DAY_NAMES, HOURS};
use crate::models::{AggregateRecord, SkippedRecord, Summary};

/// Render the full dashboard
pub fn analytics(report: &Analytics, range: Option<&DateRange>) -> String {
    let mut output = String::new();

    output.push_str("# Time Analytics\n\n");
    output.push_str(&period_line(range));
    output.push_str(&summary(&report.summary));

    output.push_str("---\n\n");
    output.push_str(&records("By Category", &report.by_category));
    output.push_str(&records("By Task Type", &report.by_task_type));
    output.push_str(&records("Daily", &report.daily));
    output.push_str(&records("Weekly", &report.weekly));
    output.push_str(&records("Monthly", &report.monthly));
    output.push_str(&skipped(&report.skipped));

    output
}

pub fn period_line(range: Option<&DateRange>) -> String {
    match range {
        Some(range) => format!("**Period:** {}\n\n", range),
        None => "**Period:** all time\n\n".to_string(),
    }
}

pub fn summary(summary: &Summary) -> String {
    let mut output = String::new();
    output.push_str(&format!("**Tasks:** {}\n", summary.total_tasks));
    output.push_str(&format!("**Total hours:** {:.2}\n", summary.total_hours));
    output.push_str(&format!("**Average per task:** {:.2} h\n\n", summary.avg_hours_per_task));
    output
}

/// One grouped breakdown as a table
pub fn records(title: &str, records: &[AggregateRecord]) -> String {
    let mut output = format!("## {}\n\n", title);

    if records.is_empty() {
        output.push_str("_No data_\n\n");
        return output;
    }

    output.push_str("| Group | Label | Hours | Tasks |\n");
    output.push_str("|-------|-------|------:|------:|\n");
    for record in records {
        output.push_str(&format!(
            "| {} | {} | {:.2} | {} |\n",
            record.group_key, record.label, record.total_hours, record.task_count
        ));
    }
    output.push('\n');

    output
}

/// Day rows by hour columns, one intensity glyph per cell
pub fn heatmap(heatmap: &Heatmap) -> String {
    let mut output = String::from("## Productivity Heatmap\n\n```\n    ");

    for hour in 0..HOURS {
        output.push_str(&format!("{:>2} ", hour));
    }
    output.push('\n');

    for (day, row) in heatmap.grid.iter().enumerate() {
        output.push_str(&format!("{} ", DAY_NAMES[day]));
        for cell in row {
            output.push_str(&format!(" {} ", heatmap.intensity(cell).glyph()));
        }
        output.push('\n');
    }
    output.push_str("```\n\n");

    let busiest = format_elapsed(heatmap.max_value.round() as u64);
    output.push_str(&format!("**Busiest hour slot:** {}\n\n", busiest));
    output.push_str(&skipped(&heatmap.skipped));

    output
}

pub fn skipped(skipped: &[SkippedRecord]) -> String {
    if skipped.is_empty() {
        return String::new();
    }

    let mut output = format!("**Skipped {} task(s):**\n\n", skipped.len());
    for record in skipped {
        output.push_str(&format!("- {} ({}): {}\n", record.title, record.task_id, record.reason));
    }
    output.push('\n');
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::summarize;
    use crate::models::Task;
    use chrono::NaiveDate;

    #[test]
    fn test_generate_records_table() {
        let rows = vec![AggregateRecord {
            group_key: "2024-W03".to_string(),
            label: "Week 3".to_string(),
            total_hours: 12.5,
            task_count: 4,
        }];

        let md = records("Weekly", &rows);
        assert!(md.contains("## Weekly"));
        assert!(md.contains("| 2024-W03 | Week 3 | 12.50 | 4 |"));
    }

    #[test]
    fn test_empty_records() {
        assert!(records("Daily", &[]).contains("_No data_"));
    }

    #[test]
    fn test_summary_and_period() {
        let md = summary(&summarize(&Vec::<Task>::new()));
        assert!(md.contains("**Tasks:** 0"));
        assert!(md.contains("**Total hours:** 0.00"));

        let range = DateRange::new(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), None);
        assert_eq!(period_line(Some(&range)), "**Period:** 2024-01-01\n\n");
        assert_eq!(period_line(None), "**Period:** all time\n\n");
    }

    #[test]
    fn test_heatmap_grid() {
        let md = heatmap(&Heatmap::empty());
        assert!(md.contains("Sun "));
        assert!(md.contains("Sat "));
        assert!(md.contains("**Busiest hour slot:** 00:00:00"));
    }

    #[test]
    fn test_skipped_list() {
        let md = skipped(&[SkippedRecord {
            task_id: 3,
            title: "Broken".to_string(),
            reason: "unparseable date 'x'".to_string(),
        }]);
        assert!(md.contains("Skipped 1 task(s)"));
        assert!(md.contains("- Broken (3): unparseable date 'x'"));
    }
}
