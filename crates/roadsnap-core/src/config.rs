use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

use crate::classify::classify;
use crate::error::ErrorCode;
use crate::model::StatusCategory;

/// Default config file name looked up in the work directory.
pub const DEFAULT_FILE_NAME: &str = "rsnap-config.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub jira: JiraConfig,
    #[serde(default)]
    pub projects: ProjectsConfig,
    #[serde(default)]
    pub epic: EpicConfig,
    #[serde(default)]
    pub status_names: StatusNames,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JiraConfig {
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub account_id: String,
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub token: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectsConfig {
    #[serde(default)]
    pub names: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EpicConfig {
    /// Custom field holding the epic start date, e.g. `customfield_10015`.
    #[serde(default)]
    pub start_date_field: Option<String>,
}

impl EpicConfig {
    /// The configured start-date field, ignoring blank values.
    #[must_use]
    pub fn start_date_field(&self) -> Option<&str> {
        self.start_date_field
            .as_deref()
            .map(str::trim)
            .filter(|field| !field.is_empty())
    }
}

/// Raw status labels accepted for each status category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusNames {
    #[serde(default)]
    pub done: Vec<String>,
    #[serde(default, rename = "progress")]
    pub in_progress: Vec<String>,
    #[serde(default)]
    pub todo: Vec<String>,
}

impl StatusNames {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.done.is_empty() && self.in_progress.is_empty() && self.todo.is_empty()
    }

    /// Configuration problems that degrade classification without failing it.
    ///
    /// An empty table makes every label `Undefined`; a label listed under
    /// several categories resolves as Done > InProgress > ToDo.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.is_empty() {
            warnings.push(format!(
                "{}: {}; every status will be classified as undefined",
                ErrorCode::StatusNamesMissing.code(),
                ErrorCode::StatusNamesMissing.message()
            ));
            return warnings;
        }

        for (name, list) in [
            ("done", &self.done),
            ("progress", &self.in_progress),
            ("todo", &self.todo),
        ] {
            if list.is_empty() {
                warnings.push(format!("status_names.{name} is empty"));
            }
        }

        let done: BTreeSet<&str> = self.done.iter().map(String::as_str).collect();
        let progress: BTreeSet<&str> = self.in_progress.iter().map(String::as_str).collect();
        let todo: BTreeSet<&str> = self.todo.iter().map(String::as_str).collect();

        let overlapping: BTreeSet<&str> = done
            .intersection(&progress)
            .chain(done.intersection(&todo))
            .chain(progress.intersection(&todo))
            .copied()
            .collect();

        for label in overlapping {
            let treated_as = match classify(label, self) {
                StatusCategory::Done => "done",
                StatusCategory::InProgress => "in progress",
                StatusCategory::ToDo => "to do",
                StatusCategory::Undefined => "undefined",
            };
            warnings.push(format!(
                "status '{label}' is listed under several categories; treated as {treated_as}"
            ));
        }

        warnings
    }
}

/// Load the TOML config file at `path`.
///
/// # Errors
///
/// Fails when the file is missing, unreadable, or not valid config TOML.
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        anyhow::bail!(
            "{}: {} at {}",
            ErrorCode::ConfigNotFound.code(),
            ErrorCode::ConfigNotFound.message(),
            path.display()
        );
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    parse_config(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Parse config text; every section is optional.
///
/// # Errors
///
/// Returns an error if the text is not valid TOML for [`Config`].
pub fn parse_config(content: &str) -> Result<Config> {
    toml::from_str::<Config>(content)
        .with_context(|| ErrorCode::ConfigParseError.message().to_string())
}
