use std::fmt::Write as _;
use std::path::PathBuf;

use anyhow::{Context as _, Result};
use chrono::{Datelike, Local};
use clap::Args;
use roadsnap_core::diff::{PlanEpic, Report, TimeWindowDiffer, VIEW_DATE_FORMAT};
use roadsnap_core::store::project_dir_name;
use serde::Serialize;
use tracing::info;

use super::{Context, write_report};
use crate::output::{pretty_kv, render};

/// Arguments for `rsnap report`.
#[derive(Args, Debug)]
pub struct ReportArgs {
    /// Calendar year to report on (default: current year).
    #[arg(long)]
    pub year: Option<i32>,
}

#[derive(Debug, Serialize)]
struct Written {
    project: String,
    year: i32,
    path: PathBuf,
    reports: Vec<Report>,
}

fn side_status(side: Option<&PlanEpic>) -> String {
    side.map_or_else(|| "-".to_string(), |epic| epic.status.to_string())
}

fn side_stories(side: Option<&PlanEpic>) -> (usize, usize) {
    side.map_or((0, 0), |epic| (epic.stories.len(), epic.stories_done))
}

fn overview_row(out: &mut String, report: &Report) {
    let _ = write!(
        out,
        "\n| [{}](#{}) | {} | {} | {:.2} | {} -> {} | {} -> {} | **{}** -> {} | {} -> **{}** |",
        report.title,
        report.anchor(),
        report.snapshot_from.format(VIEW_DATE_FORMAT),
        report.snapshot_to.format(VIEW_DATE_FORMAT),
        report.progress(),
        report.left.epics_planned,
        report.right.epics_planned,
        report.left.epics_done,
        report.right.epics_done,
        report.left.stories_planned,
        report.right.stories_planned,
        report.left.stories_done,
        report.right.stories_done,
    );
}

fn detail_section(out: &mut String, report: &Report) {
    let _ = write!(
        out,
        "\n---\n<a name=\"{}\"></a>{}\n===\n\nSnapshot From: {}  \nSnapshot To: {}  \n\n\
         | Epic Name | Status | Planning | Due Date | Progress | Stories Total | Stories Done |\n\
         | ---       | ---    | ---      | ---      | ---      | ---           | ---          |",
        report.anchor(),
        report.title,
        report.snapshot_from.format(VIEW_DATE_FORMAT),
        report.snapshot_to.format(VIEW_DATE_FORMAT),
    );

    for pair in &report.pairs {
        let (left_total, left_done) = side_stories(pair.left.as_ref());
        let (right_total, right_done) = side_stories(pair.right.as_ref());
        let _ = write!(
            out,
            "\n| [{}]({}) {} | {} -> {} | {} | {} -> {} | {:.2} | **{}** -> {} | {} -> **{}** |",
            pair.key,
            pair.link,
            pair.title,
            side_status(pair.left.as_ref()),
            side_status(pair.right.as_ref()),
            pair.planning_status(),
            pair.left_due_label(),
            pair.right_due_label(),
            pair.progress(),
            left_total,
            right_total,
            left_done,
            right_done,
        );
    }
    out.push('\n');
}

/// Markdown rendering of a year of monthly reports.
pub fn reports_markdown(project: &str, reports: &[Report]) -> String {
    let mut out = String::new();
    let (Some(first), Some(last)) = (reports.first(), reports.last()) else {
        return out;
    };

    let _ = write!(
        out,
        "\n{project}: {} - {}\n======\n\n\
         | Month | Snapshot From | Snapshot To | Progress | Epics Planned | Epics Done | Stories Planned | Stories Done |\n\
         | ---   | ---           | ---         | ---      | ---           | ---        | ---             | ---          |",
        first.from.format("%b, %Y"),
        last.to.format("%b, %Y"),
    );
    for report in reports {
        overview_row(&mut out, report);
    }
    out.push('\n');

    for report in reports {
        detail_section(&mut out, report);
    }

    out
}

pub fn run_report(args: &ReportArgs, ctx: &Context) -> Result<()> {
    let names = &ctx.config.projects.names;
    if names.is_empty() {
        anyhow::bail!("no projects configured: add [projects] names to the config file");
    }

    let year = args.year.unwrap_or_else(|| Local::now().year());
    let store = ctx.store();
    let differ = TimeWindowDiffer::new(&store, ctx.classifier(), ctx.base_url());

    let mut written = Vec::with_capacity(names.len());
    for project in names {
        info!(project = %project, year, "generating monthly reports");
        let reports = differ
            .monthly_reports(project, year)
            .with_context(|| format!("failed to build reports for {project}"))?;

        let dir_name = project_dir_name(project);
        let path = store.project_dir(project).join(format!("{dir_name}-{year}.md"));
        write_report(&path, &reports_markdown(project, &reports))?;
        written.push(Written {
            project: project.clone(),
            year,
            path,
            reports,
        });
    }

    render(ctx.output, &written, |written, w| {
        for item in written {
            pretty_kv(w, &item.project, item.path.display().to_string())?;
        }
        Ok(())
    })
}
