pub mod json;
pub mod markdown;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};

use crate::calendar::{DateRange, RangePreset};

/// Preset name that disables date filtering
pub const ALL_TIME: &str = "all";

/// Resolve the analytics window from CLI arguments.
///
/// Explicit `--from`/`--to` win over a preset; `None` means all time.
pub fn resolve_range(
    preset: Option<&str>,
    from: Option<&str>,
    to: Option<&str>,
    default_preset: &str,
) -> Result<Option<DateRange>> {
    resolve_range_on(preset, from, to, default_preset, Local::now().date_naive())
}

pub fn resolve_range_on(
    preset: Option<&str>,
    from: Option<&str>,
    to: Option<&str>,
    default_preset: &str,
    today: NaiveDate,
) -> Result<Option<DateRange>> {
    if let Some(from) = from {
        let from = parse_date(from)?;
        let to = to.map(parse_date).transpose()?;
        return Ok(Some(DateRange::new(from, to)));
    }

    let name = preset.unwrap_or(default_preset);
    if name.eq_ignore_ascii_case(ALL_TIME) {
        return Ok(None);
    }

    let preset: RangePreset = name
        .parse()
        .with_context(|| format!("Invalid date range: {}", name))?;
    Ok(Some(preset.resolve(today)))
}

/// Parse a `YYYY-MM-DD` argument
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .with_context(|| format!("Invalid date format: {}. Expected YYYY-MM-DD", value))
}
