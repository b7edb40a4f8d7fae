use std::collections::{BTreeSet, HashMap};
use std::fmt::Write as _;
use std::path::PathBuf;

use anyhow::{Context as _, Result};
use chrono::{Datelike, NaiveDate};
use clap::Args;
use roadsnap_core::classify::StatusClassifier;
use roadsnap_core::model::{EpicSnapshot, PlanningStatus, Quarter, browse_link};
use roadsnap_core::planning::{collect_due_date_history, evaluate_planning, history_before};
use roadsnap_core::store::{
    FsSnapshotStore, ProjectSnapshots, SnapshotDateIndex, SnapshotProvider, project_dir_name,
};
use roadsnap_core::summary::{Summary, summarize};
use serde::Serialize;
use tracing::info;

use super::{Context, prompt_picks, write_report};
use crate::output::{pretty_kv, pretty_section, render};

const VIEW_DATE_FORMAT: &str = "%B %-d, %Y";

/// Arguments for `rsnap list`.
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Only summarize this project directory.
    #[arg(long, value_name = "PROJECT")]
    pub project: Option<String>,
}

#[derive(Debug, Serialize)]
struct Written {
    path: PathBuf,
    summary: Summary,
    planning: PlanningByEpic,
}

/// Planning status of each epic against its due dates in earlier snapshots.
pub type PlanningByEpic = HashMap<String, PlanningStatus>;

fn view_date(date: Option<NaiveDate>) -> String {
    date.map_or_else(|| "-".to_string(), |date| date.format(VIEW_DATE_FORMAT).to_string())
}

struct MarkdownContext<'a> {
    summary: &'a Summary,
    planning: &'a PlanningByEpic,
    classifier: &'a StatusClassifier<'a>,
    base_url: &'a str,
}

fn write_epic(out: &mut String, md: &MarkdownContext<'_>, epic: &EpicSnapshot) {
    let MarkdownContext {
        summary,
        planning,
        classifier,
        base_url,
    } = md;
    let counts = classifier.count(epic);
    let quarter = epic
        .due_date
        .map(|due| format!("{} {} ", Quarter::of(due), due.year()))
        .unwrap_or_default();

    let _ = write!(
        out,
        "\n#### {quarter}[{key}]({link}): {title}\n",
        key = epic.key(),
        link = browse_link(base_url, epic.key()),
        title = epic.epic.summary,
    );

    if let Some(warning) = summary.warning_for(epic.key()) {
        let _ = write!(out, "\n> {}\n\n", warning.message);
    }

    if !epic.epic.labels.is_empty() {
        let _ = writeln!(out, "`{}`  ", epic.epic.labels.join("`, `"));
    }

    let _ = write!(
        out,
        "Status: {}  \nPlanning: {}  \nStart: {}  \nDue: {}  \nTotal: {}, Done: {}, InProgress: {}, Outstanding: {}  \nProgress: {:.2}\n",
        epic.epic.status,
        planning.get(epic.key()).map_or_else(|| "-".to_string(), ToString::to_string),
        view_date(epic.start_date),
        view_date(epic.due_date),
        counts.total,
        counts.done,
        counts.in_progress,
        counts.todo,
        counts.progress(),
    );
}

/// Markdown rendering of a bucket summary.
pub fn summary_markdown(
    summary: &Summary,
    planning: &PlanningByEpic,
    classifier: &StatusClassifier<'_>,
    base_url: &str,
) -> String {
    let md = MarkdownContext {
        summary,
        planning,
        classifier,
        base_url,
    };
    let mut out = String::new();
    let _ = write!(
        out,
        "\n{}: {}\n======================\n",
        summary.project,
        summary.date.format(VIEW_DATE_FORMAT)
    );

    let total = summary.all_count();
    for stat in summary.named_stats() {
        let _ = write!(
            out,
            "\n{} ({}/{})\n----------------------\n",
            stat.name,
            stat.epics.len(),
            total
        );
        for epic in stat.epics {
            write_epic(&mut out, &md, epic);
        }
    }

    out
}

/// Where the summary of `project` at `date` is written.
pub fn summary_path(store: &FsSnapshotStore, project: &str, date: NaiveDate) -> PathBuf {
    store
        .snapshot_dir(project, date)
        .join(format!("{}_roadsnap.md", project_dir_name(project)))
}

/// Evaluate every epic of the `date` snapshot against the snapshots before it.
pub fn planning_statuses(
    store: &FsSnapshotStore,
    project: &str,
    date: NaiveDate,
    epics: &[EpicSnapshot],
    classifier: &StatusClassifier<'_>,
) -> Result<PlanningByEpic> {
    let dates: BTreeSet<NaiveDate> = store.list_dates(project)?.into_iter().filter(|d| *d <= date).collect();
    let history = collect_due_date_history(store, project, &dates)
        .with_context(|| format!("failed to collect due-date history for {project}"))?;

    Ok(epics
        .iter()
        .map(|epic| {
            let earlier = history
                .get(epic.key())
                .map(|entries| history_before(entries, date))
                .unwrap_or_default();
            let status = evaluate_planning(
                classifier.issue_status(&epic.epic),
                date,
                epic.start_date,
                epic.due_date,
                &earlier,
            );
            (epic.key().to_string(), status)
        })
        .collect())
}

/// Summarize `project` at `date` and write the markdown report.
fn write_summary(ctx: &Context, store: &FsSnapshotStore, project: &str, date: NaiveDate) -> Result<Written> {
    let epics = store
        .load_epics(date, project)
        .with_context(|| format!("failed to list project: {project}"))?;
    let classifier = ctx.classifier();
    let summary = summarize(project, date, &epics, &classifier);
    let planning = planning_statuses(store, project, date, &epics, &classifier)?;

    let path = summary_path(store, project, date);
    write_report(&path, &summary_markdown(&summary, &planning, &classifier, ctx.base_url()))?;
    info!(project, %date, path = %path.display(), "wrote summary");
    Ok(Written {
        path,
        summary,
        planning,
    })
}

fn pick_snapshot(projects: &[ProjectSnapshots]) -> Result<(String, NaiveDate)> {
    for (i, project) in projects.iter().enumerate() {
        eprintln!("\n  * {i}: {}", project.project);
        for (j, date) in project.dates.iter().enumerate() {
            eprintln!("  | - {j}: {date}");
        }
    }

    let max_dates = projects.iter().map(|p| p.dates.len()).max().unwrap_or(0);
    let picks = prompt_picks("Enter project and date index (ex: 2, 0)", &[projects.len(), max_dates])?;
    let project = &projects[picks[0]];
    let Some(date) = project.dates.get(picks[1]) else {
        anyhow::bail!("project {} has no snapshot #{}", project.project, picks[1]);
    };
    Ok((project.project.clone(), *date))
}

pub fn run_list(args: &ListArgs, ctx: &Context) -> Result<()> {
    let store = ctx.store();
    let mut projects = store.list_projects()?;
    if let Some(only) = &args.project {
        let only = project_dir_name(only);
        projects.retain(|p| p.project == only);
    }
    if projects.is_empty() {
        anyhow::bail!("no snapshots found under {}: run `rsnap cache` first", ctx.dir.display());
    }

    let targets = if ctx.interactive {
        vec![pick_snapshot(&projects)?]
    } else {
        projects
            .iter()
            .filter_map(|p| p.dates.last().map(|date| (p.project.clone(), *date)))
            .collect()
    };

    let mut written = Vec::with_capacity(targets.len());
    for (project, date) in targets {
        written.push(write_summary(ctx, &store, &project, date)?);
    }

    render(ctx.output, &written, |written, w| {
        for item in written {
            pretty_section(w, &format!("{} @ {}", item.summary.project, item.summary.date))?;
            for stat in item.summary.named_stats() {
                pretty_kv(w, stat.name, stat.epics.len().to_string())?;
            }
            pretty_kv(w, "Warnings", item.summary.warnings.len().to_string())?;
            pretty_kv(w, "Written", item.path.display().to_string())?;
        }
        Ok(())
    })
}
