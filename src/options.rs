use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

use crate::db::Database;
use crate::error::{Result, TrackerError};

pub const OPTIONS_KEY: &str = "options";

/// User-extensible mapping from slug to display label
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OptionSet(BTreeMap<String, String>);

impl OptionSet {
    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        Self(
            pairs
                .iter()
                .map(|(key, label)| (key.to_string(), label.to_string()))
                .collect(),
        )
    }

    /// Add or relabel an entry, returning the slug it was stored under
    pub fn add(&mut self, key: &str, label: &str) -> Result<String> {
        let label = label.trim();
        if key.trim().is_empty() || label.is_empty() {
            return Err(TrackerError::Validation(
                "option key and label must not be empty".to_string(),
            ));
        }

        let slug = slugify(key);
        self.0.insert(slug.clone(), label.to_string());
        Ok(slug)
    }

    /// Tasks that reference a removed key keep it
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.remove(key)
    }

    /// Display label, or the key itself when it is no longer known
    pub fn label<'a>(&'a self, key: &'a str) -> &'a str {
        self.0.get(key).map(String::as_str).unwrap_or(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Lower-case, trimmed, whitespace runs collapsed to `-`
pub fn slugify(key: &str) -> String {
    let lowered = key.trim().to_lowercase();

    match Regex::new(r"\s+") {
        Ok(re) => re.replace_all(&lowered, "-").into_owned(),
        Err(_) => lowered.split_whitespace().collect::<Vec<_>>().join("-"),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    Category,
    System,
    TaskType,
}

impl OptionKind {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "category" | "categories" => Some(OptionKind::Category),
            "system" | "systems" => Some(OptionKind::System),
            "type" | "task-type" | "task-types" | "types" => Some(OptionKind::TaskType),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OptionKind::Category => "category",
            OptionKind::System => "system",
            OptionKind::TaskType => "task type",
        }
    }
}

/// The three option sets offered when logging a task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Options {
    pub categories: OptionSet,
    pub systems: OptionSet,
    pub task_types: OptionSet,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            categories: OptionSet::from_pairs(&[
                ("sap-ewm", "SAP EWM"),
                ("sap-mm", "SAP MM"),
                ("documentation", "Documentation"),
                ("testing", "Testing"),
                ("meeting", "Meeting"),
            ]),
            systems: OptionSet::from_pairs(&[
                ("dev", "Development"),
                ("qa", "Quality Assurance"),
                ("prod", "Production"),
            ]),
            task_types: OptionSet::from_pairs(&[
                ("implementation", "Implementation"),
                ("configuration", "Configuration"),
                ("support", "Support"),
                ("analysis", "Analysis"),
            ]),
        }
    }
}

impl Options {
    /// Load persisted option sets, falling back to the defaults
    pub fn load(db: &Database) -> Result<Self> {
        match db.load_json::<Options>(OPTIONS_KEY) {
            Ok(Some(options)) => Ok(options),
            Ok(None) => Ok(Options::default()),
            Err(err @ TrackerError::MalformedPersistedState { .. }) => {
                warn!(error = %err, "discarding unreadable option sets");
                Ok(Options::default())
            }
            Err(err) => Err(err),
        }
    }

    pub fn save(&self, db: &Database) -> Result<()> {
        db.save_json(OPTIONS_KEY, self)
    }

    pub fn set(&self, kind: OptionKind) -> &OptionSet {
        match kind {
            OptionKind::Category => &self.categories,
            OptionKind::System => &self.systems,
            OptionKind::TaskType => &self.task_types,
        }
    }

    pub fn set_mut(&mut self, kind: OptionKind) -> &mut OptionSet {
        match kind {
            OptionKind::Category => &mut self.categories,
            OptionKind::System => &mut self.systems,
            OptionKind::TaskType => &mut self.task_types,
        }
    }
}
