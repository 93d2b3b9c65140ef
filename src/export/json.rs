use anyhow::Result;

use crate::export::ExportRecord;

/// Generate JSON export
pub fn generate(records: &[ExportRecord]) -> Result<String> {
    let json = serde_json::to_string_pretty(records)?;
    Ok(json)
}
