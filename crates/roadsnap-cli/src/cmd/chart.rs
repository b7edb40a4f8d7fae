use std::fmt::Write as _;
use std::path::PathBuf;

use anyhow::{Context as _, Result};
use chrono::NaiveDate;
use clap::Args;
use roadsnap_core::model::Bucket;
use roadsnap_core::store::{SnapshotProvider, project_dir_name};
use roadsnap_core::summary::summarize;
use serde::Serialize;
use tracing::info;

use super::{Context, write_report};
use crate::output::{pretty_kv, render};

const CHART_FILE: &str = "roadmap-stats.svg";
const BAR_WIDTH: u32 = 150;
const BAR_SPACING: u32 = 50;
const PLOT_HEIGHT: u32 = 340;
const TOP: u32 = 100;
const LEFT: u32 = 40;
const MIN_LABEL_HEIGHT: f64 = 14.0;

/// Arguments for `rsnap chart`.
#[derive(Args, Debug)]
pub struct ChartArgs {
    /// Only chart this project directory.
    #[arg(long, value_name = "PROJECT")]
    pub project: Option<String>,
}

/// One bar segment: bucket size against the number of bucketed epics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Segment {
    pub bucket: Bucket,
    pub name: &'static str,
    pub value: usize,
    pub max: usize,
}

/// One bar per snapshot date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub segments: Vec<Segment>,
}

#[derive(Debug, Serialize)]
struct Charted {
    project: String,
    path: PathBuf,
    bars: Vec<Bar>,
}

const fn color(bucket: Bucket) -> &'static str {
    match bucket {
        Bucket::Done => "#2e9e44",
        Bucket::Ongoing => "#1f6fd1",
        Bucket::Overdue => "#d33a2c",
        Bucket::Outstanding => "#64505a",
    }
}

fn xml_escape(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Render stacked bars as an SVG document.
#[allow(clippy::cast_precision_loss)]
pub fn chart_svg(title: &str, bars: &[Bar]) -> String {
    let bar_count = u32::try_from(bars.len()).unwrap_or(u32::MAX).max(1);
    let width = LEFT * 2 + bar_count * (BAR_WIDTH + BAR_SPACING);
    let height = TOP + PLOT_HEIGHT + 60;
    let baseline = f64::from(TOP + PLOT_HEIGHT);
    let scale = bars
        .iter()
        .map(|bar| bar.segments.iter().map(|s| s.value).sum::<usize>())
        .max()
        .unwrap_or(0)
        .max(1) as f64;

    let mut svg = String::new();
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}" font-family="sans-serif">"#
    );
    let _ = writeln!(
        svg,
        r#"  <text x="{}" y="40" text-anchor="middle" font-size="20">{}</text>"#,
        width / 2,
        xml_escape(title)
    );

    let mut x = LEFT + BAR_SPACING / 2;
    for bar in bars {
        let mut top = baseline;
        for segment in bar.segments.iter().filter(|s| s.value > 0) {
            let h = segment.value as f64 / scale * f64::from(PLOT_HEIGHT);
            top -= h;
            let _ = writeln!(
                svg,
                r#"  <rect x="{x}" y="{top:.1}" width="{BAR_WIDTH}" height="{h:.1}" fill="{}"/>"#,
                color(segment.bucket)
            );
            if h >= MIN_LABEL_HEIGHT {
                let _ = writeln!(
                    svg,
                    r##"  <text x="{}" y="{:.1}" text-anchor="middle" font-size="12" fill="#ffffff">{} ({}/{})</text>"##,
                    x + BAR_WIDTH / 2,
                    top + h / 2.0 + 4.0,
                    xml_escape(segment.name),
                    segment.value,
                    segment.max
                );
            }
        }
        let _ = writeln!(
            svg,
            r#"  <text x="{}" y="{:.1}" text-anchor="middle" font-size="13">{}</text>"#,
            x + BAR_WIDTH / 2,
            baseline + 24.0,
            bar.date.format("%b %d, %Y")
        );
        x += BAR_WIDTH + BAR_SPACING;
    }

    svg.push_str("</svg>\n");
    svg
}

/// Summarize every snapshot date of `project` into bars.
pub fn collect_bars(ctx: &Context, project: &str, dates: &[NaiveDate]) -> Result<Vec<Bar>> {
    let store = ctx.store();
    let classifier = ctx.classifier();

    dates
        .iter()
        .map(|&date| {
            let epics = store
                .load_epics(date, project)
                .with_context(|| format!("failed to generate summary for {date}, {project}"))?;
            let summary = summarize(project, date, &epics, &classifier);
            let max = summary.all_count();
            Ok(Bar {
                date,
                segments: summary
                    .named_stats()
                    .into_iter()
                    .map(|stat| Segment {
                        bucket: stat.bucket,
                        name: stat.name,
                        value: stat.epics.len(),
                        max,
                    })
                    .collect(),
            })
        })
        .collect()
}

pub fn run_chart(args: &ChartArgs, ctx: &Context) -> Result<()> {
    let store = ctx.store();
    let mut projects = store.list_projects()?;
    if let Some(only) = &args.project {
        let only = project_dir_name(only);
        projects.retain(|p| p.project == only);
    }
    if projects.is_empty() {
        anyhow::bail!("no snapshots found under {}: run `rsnap cache` first", ctx.dir.display());
    }

    let mut charted = Vec::with_capacity(projects.len());
    for project in projects {
        let bars = collect_bars(ctx, &project.project, &project.dates)?;
        let path = store.project_dir(&project.project).join(CHART_FILE);
        write_report(&path, &chart_svg(&project.project, &bars))?;
        info!(project = %project.project, path = %path.display(), "wrote chart");
        charted.push(Charted {
            project: project.project,
            path,
            bars,
        });
    }

    render(ctx.output, &charted, |charted, w| {
        for item in charted {
            pretty_kv(w, &item.project, format!("{} ({} snapshots)", item.path.display(), item.bars.len()))?;
        }
        Ok(())
    })
}
