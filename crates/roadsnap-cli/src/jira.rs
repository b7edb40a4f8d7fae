//! Minimal Jira search client used by `rsnap cache`.

use std::cell::Cell;

use anyhow::{Context as _, Result};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use roadsnap_core::config::JiraConfig;
use roadsnap_core::error::IssueSourceError;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

/// Env var consulted when the config file carries no token.
pub const TOKEN_ENV: &str = "ROADSNAP_JIRA_TOKEN";

const PAGE_SIZE: usize = 100;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchPage {
    #[serde(default)]
    start_at: usize,
    #[serde(default)]
    total: usize,
    #[serde(default)]
    issues: Vec<Value>,
}

/// JQL selecting the epics of `project`.
#[must_use]
pub fn epics_jql(project: &str) -> String {
    format!(r#"project="{}" AND issuetype="Epic""#, project.replace('"', r#"\""#))
}

/// JQL selecting the issues linked to `epic_key`.
#[must_use]
pub fn epic_issues_jql(epic_key: &str) -> String {
    format!(r#""Epic Link"={epic_key}"#)
}

pub struct JiraClient {
    base_url: String,
    authorization: String,
    requests: Cell<usize>,
}

impl JiraClient {
    /// Build a client from config, falling back to [`TOKEN_ENV`] for the token.
    pub fn from_config(config: &JiraConfig) -> Result<Self> {
        if config.base_url.trim().is_empty() {
            anyhow::bail!("jira.base_url is not configured");
        }

        let token = if config.token.is_empty() {
            std::env::var(TOKEN_ENV)
                .with_context(|| format!("jira.token is empty and {TOKEN_ENV} is not set"))?
        } else {
            config.token.clone()
        };

        Ok(Self::new(&config.base_url, &config.user, &token))
    }

    #[must_use]
    pub fn new(base_url: &str, user: &str, token: &str) -> Self {
        let credentials = STANDARD.encode(format!("{user}:{token}"));
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            authorization: format!("Basic {credentials}"),
            requests: Cell::new(0),
        }
    }

    pub fn request_count(&self) -> usize {
        self.requests.get()
    }

    /// Raw epic records of `project`.
    pub fn list_epics(&self, project: &str) -> Result<Vec<Value>> {
        self.search(&epics_jql(project))
            .with_context(|| format!("failed to fetch epics for project: {project}"))
    }

    /// Raw child issue records of `epic_key`.
    pub fn list_epic_issues(&self, epic_key: &str) -> Result<Vec<Value>> {
        self.search(&epic_issues_jql(epic_key))
            .with_context(|| format!("failed to fetch issues for epic: {epic_key}"))
    }

    fn search(&self, jql: &str) -> Result<Vec<Value>> {
        let mut issues = Vec::new();
        let mut start_at = 0_usize;

        loop {
            let page = self.search_page(jql, start_at)?;
            let fetched = page.issues.len();
            issues.extend(page.issues);

            if fetched == 0 || page.start_at + fetched >= page.total {
                break;
            }
            start_at = page.start_at + fetched;
        }

        debug!(jql, issues = issues.len(), "jira search complete");
        Ok(issues)
    }

    fn search_page(&self, jql: &str, start_at: usize) -> Result<SearchPage> {
        self.requests.set(self.requests.get() + 1);

        let url = format!("{}/rest/api/2/search", self.base_url);
        let response = ureq::get(&url)
            .set("Accept", "application/json")
            .set("User-Agent", "roadsnap-cli")
            .set("Authorization", &self.authorization)
            .query("jql", jql)
            .query("startAt", &start_at.to_string())
            .query("maxResults", &PAGE_SIZE.to_string())
            .call()
            .map_err(|err| IssueSourceError::Request {
                url: url.clone(),
                reason: err.to_string(),
            })?;

        let page = response
            .into_json::<SearchPage>()
            .map_err(|err| IssueSourceError::Decode {
                url,
                reason: err.to_string(),
            })?;
        Ok(page)
    }
}
