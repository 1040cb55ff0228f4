use crate::error::{Result, ResultExt as _};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Token rules the loader uses to turn raw text into typed cells.
///
/// The same rules coerce literal fill values and string operands compared
/// against date-time columns, so a value that loads also fills.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct InferenceSettings {
    /// Tokens read as a missing cell (compared after trimming)
    pub missing_tokens: Vec<String>,
    pub true_tokens: Vec<String>,
    pub false_tokens: Vec<String>,
    /// `chrono` format strings, tried in order. Date-only formats yield midnight.
    pub datetime_formats: Vec<String>,
    /// Upper bound on distinct values for a text column to be Categorical
    pub categorical_max_distinct: usize,
    /// Upper bound on distinct / non-missing for a text column to be Categorical
    pub categorical_max_ratio: f64,
}

impl Default for InferenceSettings {
    fn default() -> Self {
        Self {
            missing_tokens: ["", "NA", "N/A", "NaN", "nan", "null", "NULL", "None"]
                .into_iter()
                .map(str::to_owned)
                .collect(),
            true_tokens: vec!["true".to_owned(), "True".to_owned(), "TRUE".to_owned()],
            false_tokens: vec!["false".to_owned(), "False".to_owned(), "FALSE".to_owned()],
            datetime_formats: [
                "%Y-%m-%d %H:%M:%S",
                "%Y-%m-%dT%H:%M:%S",
                "%Y-%m-%d %H:%M",
                "%Y-%m-%d",
                "%d/%m/%Y",
                "%Y/%m/%d",
            ]
            .into_iter()
            .map(str::to_owned)
            .collect(),
            categorical_max_distinct: 20,
            categorical_max_ratio: 0.5,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct SummarySettings {
    /// How many most-frequent values a text summary lists
    pub top_values: usize,
}

impl Default for SummarySettings {
    fn default() -> Self {
        Self { top_values: 5 }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct EngineSettings {
    pub inference: InferenceSettings,
    pub summary: SummarySettings,
}

/// Reads settings from a JSON file. Fields absent from the file keep their defaults.
pub fn load_settings(path: &Path) -> Result<EngineSettings> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read settings file {}", path.display()))?;
    let settings = serde_json::from_str::<EngineSettings>(&content)
        .with_context(|| format!("Failed to parse settings file {}", path.display()))?;
    Ok(settings)
}

pub fn save_settings(settings: &EngineSettings, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string_pretty(settings)?;
    std::fs::write(path, content)?;
    Ok(())
}
