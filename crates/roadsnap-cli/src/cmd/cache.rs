use anyhow::{Context as _, Result};
use chrono::{Local, NaiveDate};
use clap::Args;
use roadsnap_core::store::FsSnapshotStore;
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use super::{Context, prompt_picks};
use crate::jira::JiraClient;
use crate::output::{pretty_kv, pretty_section, render};

/// Arguments for `rsnap cache`.
#[derive(Args, Debug)]
pub struct CacheArgs {
    /// Snapshot date to record under (default: today).
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Default, Serialize)]
struct CacheReport {
    date: String,
    projects: Vec<CachedProject>,
    api_requests: usize,
}

#[derive(Debug, Serialize)]
struct CachedProject {
    project: String,
    epics: usize,
    issues: usize,
}

/// Source of raw issue records.
pub trait IssueSource {
    fn epics(&self, project: &str) -> Result<Vec<Value>>;
    fn epic_issues(&self, epic_key: &str) -> Result<Vec<Value>>;
}

impl IssueSource for JiraClient {
    fn epics(&self, project: &str) -> Result<Vec<Value>> {
        self.list_epics(project)
    }

    fn epic_issues(&self, epic_key: &str) -> Result<Vec<Value>> {
        self.list_epic_issues(epic_key)
    }
}

/// Fetch `project` from `source` and record it as the `date` snapshot.
fn cache_project(
    source: &dyn IssueSource,
    store: &FsSnapshotStore,
    project: &str,
    date: NaiveDate,
) -> Result<CachedProject> {
    let epics = source.epics(project)?;
    store
        .save_epics(project, date, &epics)
        .with_context(|| format!("failed to record epics for project: {project}"))?;

    let mut issue_count = 0;
    for epic in &epics {
        let Some(key) = epic.get("key").and_then(Value::as_str) else {
            anyhow::bail!("epic record without key in project {project}");
        };

        let issues = source.epic_issues(key)?;
        store
            .save_issues(project, date, key, &issues)
            .with_context(|| format!("failed to record issues for epic: {key}"))?;

        info!(project, epic = key, issues = issues.len(), "cached epic issues");
        issue_count += issues.len();
    }

    Ok(CachedProject {
        project: project.to_string(),
        epics: epics.len(),
        issues: issue_count,
    })
}

pub fn run_cache(args: &CacheArgs, ctx: &Context) -> Result<()> {
    let names = &ctx.config.projects.names;
    if names.is_empty() {
        anyhow::bail!("no projects configured: add [projects] names to the config file");
    }

    let selected: Vec<&String> = if ctx.interactive {
        for (i, name) in names.iter().enumerate() {
            eprintln!("  * {i}: {name}");
        }
        let picks = prompt_picks("Pick a project to cache (ex: 2)", &[names.len()])?;
        vec![&names[picks[0]]]
    } else {
        names.iter().collect()
    };

    let client = JiraClient::from_config(&ctx.config.jira)?;
    let store = ctx.store();
    let date = args.date.unwrap_or_else(|| Local::now().date_naive());

    let mut report = CacheReport {
        date: date.to_string(),
        ..CacheReport::default()
    };
    for project in selected {
        info!(project = %project, %date, "caching project");
        report.projects.push(cache_project(&client, &store, project, date)?);
    }
    report.api_requests = client.request_count();

    render(ctx.output, &report, |report, w| {
        pretty_section(w, &format!("Snapshot {}", report.date))?;
        for project in &report.projects {
            pretty_kv(
                w,
                &project.project,
                format!("{} epics, {} issues", project.epics, project.issues),
            )?;
        }
        Ok(())
    })
}
