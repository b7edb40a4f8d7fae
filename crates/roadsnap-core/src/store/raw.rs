//! Parsing of issue records as returned by the Jira search API.

use std::path::Path;

use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::SnapshotError;
use crate::model::Issue;

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Deserialize)]
pub struct RawIssue {
    pub key: String,
    #[serde(default)]
    pub fields: RawFields,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawFields {
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub status: Option<RawStatus>,
    #[serde(default)]
    pub labels: Option<Vec<String>>,
    #[serde(default)]
    pub duedate: Option<NaiveDate>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct RawStatus {
    #[serde(default)]
    pub name: String,
}

impl RawIssue {
    #[must_use]
    pub fn to_issue(&self) -> Issue {
        Issue {
            key: self.key.clone(),
            summary: self.fields.summary.clone().unwrap_or_default(),
            status: self
                .fields
                .status
                .as_ref()
                .map(|status| status.name.clone())
                .unwrap_or_default(),
            labels: self.fields.labels.clone().unwrap_or_default(),
            due_date: self.fields.duedate,
        }
    }

    /// Read a date-valued custom field. Missing and `null` are unset.
    pub fn date_field(&self, field: &str) -> Result<Option<NaiveDate>, String> {
        match self.fields.other.get(field) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(raw)) => NaiveDate::parse_from_str(raw, DATE_FORMAT)
                .map(Some)
                .map_err(|err| format!("{}: field {field} = '{raw}': {err}", self.key)),
            Some(other) => Err(format!("{}: field {field} is not a date: {other}", self.key)),
        }
    }
}

/// Parse a stored JSON array of issue records.
pub fn parse_issues(path: &Path, content: &str) -> Result<Vec<RawIssue>, SnapshotError> {
    serde_json::from_str(content).map_err(|err| SnapshotError::CorruptData {
        path: path.to_path_buf(),
        reason: err.to_string(),
    })
}
