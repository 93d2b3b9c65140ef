use anyhow::Result;
use std::io::Write;

use crate::export::ExportRecord;

pub const HEADER: [&str; 11] = [
    "Title",
    "Date",
    "Start Time",
    "End Time",
    "Duration",
    "Category",
    "System",
    "Task Type",
    "Project",
    "Ticket Number",
    "Description",
];

/// Generate CSV export.
///
/// Fields are written unquoted; commas in descriptions become semicolons.
pub fn generate<W: Write>(records: &[ExportRecord], writer: W) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Never)
        .from_writer(writer);

    wtr.write_record(HEADER)?;

    for record in records {
        let description = record.description.replace(',', ";");

        wtr.write_record([
            record.title.as_str(),
            record.date.as_str(),
            record.start_time.as_str(),
            record.end_time.as_str(),
            record.duration.as_str(),
            record.category.as_str(),
            record.system.as_str(),
            record.task_type.as_str(),
            record.project.as_str(),
            record.ticket_number.as_str(),
            description.as_str(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Generate CSV export as string
pub fn generate_string(records: &[ExportRecord]) -> Result<String> {
    let mut buffer = Vec::new();
    generate(records, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::{fixtures, records};
    use crate::options::Options;

    #[test]
    fn test_generate_csv() {
        let task = fixtures::task();
        let rows = records([&task], &Options::default(), "%-m/%-d/%Y");

        let csv = generate_string(&rows).unwrap();
        let mut lines = csv.lines();

        assert_eq!(
            lines.next(),
            Some("Title,Date,Start Time,End Time,Duration,Category,System,Task Type,Project,Ticket Number,Description")
        );
        assert_eq!(
            lines.next(),
            Some("Putaway strategy,1/15/2024,09:00,17:30,08:30,SAP EWM,Quality Assurance,Configuration,Rollout,EWM-101,a;b")
        );
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_header_only_when_empty() {
        let csv = generate_string(&[]).unwrap();
        assert_eq!(csv.lines().count(), 1);
    }
}
