use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Global configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalConfig {
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub export: ExportSettings,
    #[serde(default)]
    pub analytics: AnalyticsSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_database_path")]
    pub database_path: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

fn default_database_path() -> String {
    "~/.local/share/consult-time/data.db".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportSettings {
    #[serde(default = "default_format")]
    pub default_format: String,
    /// chrono format for the human-readable task date
    #[serde(default = "default_date_format")]
    pub date_format: String,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            default_format: default_format(),
            date_format: default_date_format(),
        }
    }
}

fn default_format() -> String {
    "json".to_string()
}

fn default_date_format() -> String {
    "%-m/%-d/%Y".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsSettings {
    #[serde(default = "default_range")]
    pub default_range: String,
}

impl Default for AnalyticsSettings {
    fn default() -> Self {
        Self {
            default_range: default_range(),
        }
    }
}

fn default_range() -> String {
    "last30days".to_string()
}

/// Configuration with paths expanded
#[derive(Debug, Clone)]
pub struct EffectiveConfig {
    pub database_path: PathBuf,
    pub export_format: String,
    pub date_format: String,
    pub default_range: String,
}

impl EffectiveConfig {
    pub fn load() -> Result<Self> {
        Self::from_global(load_global_config()?)
    }

    pub fn from_global(global: GlobalConfig) -> Result<Self> {
        Ok(Self {
            database_path: expand_path(&global.settings.database_path)?,
            export_format: global.export.default_format,
            date_format: global.export.date_format,
            default_range: global.analytics.default_range,
        })
    }
}

/// Get the global config directory path
pub fn global_config_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .context("Could not determine config directory")?
        .join("consult-time");
    Ok(config_dir)
}

/// Get the global config file path
pub fn global_config_path() -> Result<PathBuf> {
    Ok(global_config_dir()?.join("config.toml"))
}

/// Load global configuration from ~/.config/consult-time/config.toml
pub fn load_global_config() -> Result<GlobalConfig> {
    let config_path = global_config_path()?;

    if !config_path.exists() {
        return Ok(GlobalConfig::default());
    }

    let content = std::fs::read_to_string(&config_path)
        .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

    parse_config(&content)
        .with_context(|| format!("Failed to parse config file: {}", config_path.display()))
}

pub fn parse_config(content: &str) -> Result<GlobalConfig> {
    Ok(toml::from_str(content)?)
}

/// Initialize global config directory and create default config if not exists
pub fn init_global_config() -> Result<PathBuf> {
    let config_dir = global_config_dir()?;
    std::fs::create_dir_all(&config_dir)
        .with_context(|| format!("Failed to create config directory: {}", config_dir.display()))?;

    let config_path = config_dir.join("config.toml");

    if !config_path.exists() {
        let default_config = GlobalConfig::default();
        let content = toml::to_string_pretty(&default_config)
            .context("Failed to serialize default config")?;
        std::fs::write(&config_path, content)
            .with_context(|| format!("Failed to write config file: {}", config_path.display()))?;
    }

    Ok(config_path)
}

/// Expand ~ and environment variables in path
pub fn expand_path(path: &str) -> Result<PathBuf> {
    let expanded = shellexpand::full(path)
        .with_context(|| format!("Failed to expand path: {}", path))?;
    Ok(PathBuf::from(expanded.as_ref()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GlobalConfig::default();
        assert_eq!(config.export.default_format, "json");
        assert_eq!(config.export.date_format, "%-m/%-d/%Y");
        assert_eq!(config.analytics.default_range, "last30days");
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config = parse_config(
            r#"
            [export]
            default_format = "csv"
            "#,
        )
        .unwrap();

        assert_eq!(config.export.default_format, "csv");
        assert_eq!(config.export.date_format, "%-m/%-d/%Y");
        assert!(config.settings.database_path.ends_with("data.db"));
    }

    #[test]
    fn test_default_config_round_trips_through_toml() {
        let text = toml::to_string_pretty(&GlobalConfig::default()).unwrap();
        let parsed = parse_config(&text).unwrap();
        assert_eq!(parsed.analytics.default_range, "last30days");
    }

    #[test]
    fn test_expand_path() {
        let expanded = expand_path("~/.config/test").unwrap();
        assert!(expanded.to_string_lossy().contains("/.config/test"));
        assert!(!expanded.to_string_lossy().starts_with("~"));
    }
}
