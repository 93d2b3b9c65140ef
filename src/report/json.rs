use anyhow::Result;
use serde::Serialize;

/// Generate JSON report for any analytics value
pub fn generate<T: Serialize + ?Sized>(report: &T) -> Result<String> {
    let json = serde_json::to_string_pretty(report)?;
    Ok(json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::summarize;
    use crate::heatmap::Heatmap;
    use crate::models::Task;

    #[test]
    fn test_generate_summary_json() {
        let json = generate(&summarize(&Vec::<Task>::new())).unwrap();
        assert!(json.contains("\"total_tasks\": 0"));
        assert!(json.contains("\"avg_hours_per_task\": 0.0"));
    }

    #[test]
    fn test_generate_heatmap_json() {
        let json = generate(&Heatmap::empty()).unwrap();
        assert!(json.contains("\"max_value\": 0.0"));
        assert!(json.contains("\"hour_of_day\": 23"));
    }
}
