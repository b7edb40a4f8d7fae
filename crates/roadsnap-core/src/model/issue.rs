use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single record from the issue source: an epic or one of its stories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Issue {
    pub key: String,
    pub summary: String,
    /// Raw status label as reported by the source (e.g. `"In Review"`).
    pub status: String,
    pub labels: Vec<String>,
    pub due_date: Option<NaiveDate>,
}

impl Default for Issue {
    fn default() -> Self {
        Self {
            key: String::new(),
            summary: String::new(),
            status: String::new(),
            labels: Vec::new(),
            due_date: None,
        }
    }
}

impl Issue {
    #[must_use]
    pub fn new(key: impl Into<String>, summary: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            summary: summary.into(),
            status: status.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_due_date(mut self, due_date: NaiveDate) -> Self {
        self.due_date = Some(due_date);
        self
    }

    #[must_use]
    pub fn with_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.labels = labels.into_iter().map(Into::into).collect();
        self
    }
}

/// Display link for an issue key: `<base_url>/browse/<key>`.
#[must_use]
pub fn browse_link(base_url: &str, key: &str) -> String {
    format!("{}/browse/{key}", base_url.trim_end_matches('/'))
}
