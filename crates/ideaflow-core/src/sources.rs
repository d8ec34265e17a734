//! Source-list configuration: which subreddits the ingestion job walks.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Fallback source list used when no sources file is present.
pub const DEFAULT_SOURCES: &[&str] = &[
    "Entrepreneur",
    "SaaS",
    "smallbusiness",
    "startups",
    "EntrepreneurRideAlong",
    "SideProject",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesFile {
    pub sources: Vec<String>,
}

impl SourcesFile {
    /// The built-in default source list.
    #[must_use]
    pub fn default_list() -> Self {
        Self {
            sources: DEFAULT_SOURCES.iter().map(|s| (*s).to_string()).collect(),
        }
    }
}

/// Load and validate the source list from a YAML file.
///
/// Falls back to [`DEFAULT_SOURCES`] when the file does not exist; a file
/// that exists but cannot be read or parsed is an error.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_sources(path: &Path) -> Result<SourcesFile, ConfigError> {
    if !path.exists() {
        return Ok(SourcesFile::default_list());
    }

    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::SourcesFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let sources_file: SourcesFile = serde_yaml::from_str(&content)?;
    validate_sources(&sources_file)?;

    Ok(sources_file)
}

fn validate_sources(file: &SourcesFile) -> Result<(), ConfigError> {
    if file.sources.is_empty() {
        return Err(ConfigError::Validation(
            "sources list must not be empty".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for source in &file.sources {
        if source.trim().is_empty() {
            return Err(ConfigError::Validation(
                "source name must be non-empty".to_string(),
            ));
        }

        // Subreddit names: letters, digits, underscores.
        if !source.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(ConfigError::Validation(format!(
                "invalid source name '{source}'; expected a subreddit name"
            )));
        }

        if !seen.insert(source.to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "duplicate source: '{source}'"
            )));
        }
    }

    Ok(())
}
