//! Time-window planning reports.
//!
//! A report compares the epics due inside `[from, to]` as recorded in two
//! snapshots: the earliest snapshot taken on or after `from` (left) and the
//! latest one taken on or before `to` (right).

use std::collections::{BTreeSet, HashMap};

use chrono::{Months, NaiveDate};
use serde::Serialize;
use tracing::{debug, instrument};

use crate::classify::StatusClassifier;
use crate::error::SnapshotError;
use crate::model::{EpicSnapshot, Issue, PlanningStatus, StatusCategory, browse_link};
use crate::planning::pair_planning_status;
use crate::store::{SnapshotDateIndex, SnapshotProvider};

/// Display format of due dates and snapshot dates in reports.
pub const VIEW_DATE_FORMAT: &str = "%b %-d, %Y";

/// Label used for the due date of an absent side.
pub const RESCHEDULED: &str = "Rescheduled";

/// One child issue as seen in one snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanStory {
    pub snapshot_date: NaiveDate,
    pub key: String,
    pub title: String,
    pub link: String,
    pub status: StatusCategory,
}

/// One epic as seen in one snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanEpic {
    pub key: String,
    pub title: String,
    pub link: String,
    pub snapshot_date: NaiveDate,
    pub start_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub status: StatusCategory,
    pub stories: Vec<PlanStory>,
    pub stories_done: usize,
}

/// Left and right views of one epic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportPair {
    pub key: String,
    pub title: String,
    pub link: String,
    pub left: Option<PlanEpic>,
    pub right: Option<PlanEpic>,
}

impl ReportPair {
    #[must_use]
    pub const fn has_left(&self) -> bool {
        self.left.is_some()
    }

    #[must_use]
    pub const fn has_right(&self) -> bool {
        self.right.is_some()
    }

    #[must_use]
    pub fn planning_status(&self) -> PlanningStatus {
        pair_planning_status(
            self.left.as_ref().map(|epic| epic.due_date),
            self.right.as_ref().map(|epic| epic.due_date),
        )
    }

    /// Stories done on the right relative to the stories planned on the left.
    ///
    /// An epic that only appears on the right is measured against its own
    /// story count.
    #[must_use]
    pub fn progress(&self) -> f64 {
        let Some(right) = &self.right else {
            return 0.0;
        };
        let planned = self.left.as_ref().map_or(right.stories.len(), |left| left.stories.len());
        ratio(right.stories_done, planned)
    }

    #[must_use]
    pub fn left_due_label(&self) -> String {
        due_label(self.left.as_ref())
    }

    #[must_use]
    pub fn right_due_label(&self) -> String {
        due_label(self.right.as_ref())
    }
}

fn due_label(side: Option<&PlanEpic>) -> String {
    match side {
        None => RESCHEDULED.to_string(),
        Some(epic) => epic
            .due_date
            .map_or_else(|| "-".to_string(), |due| due.format(VIEW_DATE_FORMAT).to_string()),
    }
}

#[allow(clippy::cast_precision_loss)]
fn ratio(done: usize, planned: usize) -> f64 {
    if done == 0 || planned == 0 {
        return 0.0;
    }
    done as f64 / planned as f64
}

/// Epic and story counters for one side of a report.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SideCounters {
    pub epics_planned: usize,
    pub epics_done: usize,
    pub stories_planned: usize,
    pub stories_done: usize,
}

impl SideCounters {
    fn record(&mut self, epic: &PlanEpic) {
        self.epics_planned += 1;
        self.stories_planned += epic.stories.len();
        if epic.status.is_done() {
            self.epics_done += 1;
        }
        self.stories_done += epic.stories_done;
    }
}

/// Comparison of two snapshots over one reporting window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub title: String,
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub snapshot_from: NaiveDate,
    pub snapshot_to: NaiveDate,
    pub left: SideCounters,
    pub right: SideCounters,
    pub pairs: Vec<ReportPair>,
}

impl Report {
    /// Stories done at the end of the window over stories planned at its start.
    #[must_use]
    pub fn progress(&self) -> f64 {
        ratio(self.right.stories_done, self.left.stories_planned)
    }

    /// Anchor used to link the overview row to the detail section.
    #[must_use]
    pub fn anchor(&self) -> String {
        self.to.format("%Y-%m").to_string()
    }
}

/// Pick the snapshot dates bracketing `[from, to]`.
///
/// Left is the earliest snapshot on or after `from`, else the latest overall.
/// Right is the latest snapshot on or before `to`, else the left one.
#[must_use]
pub fn resolve_snapshot_window(
    dates: &BTreeSet<NaiveDate>,
    from: NaiveDate,
    to: NaiveDate,
) -> Option<(NaiveDate, NaiveDate)> {
    let left = dates.range(from..).next().or_else(|| dates.last()).copied()?;
    let right = dates.range(..=to).next_back().copied().unwrap_or(left);
    Some((left, right))
}

/// First and last day of `month` in `year`.
#[must_use]
pub fn month_window(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let last = first.checked_add_months(Months::new(1))?.pred_opt()?;
    Some((first, last))
}

/// Builds [`Report`]s from a snapshot store.
pub struct TimeWindowDiffer<'a, S: ?Sized> {
    store: &'a S,
    classifier: StatusClassifier<'a>,
    base_url: &'a str,
}

impl<'a, S> TimeWindowDiffer<'a, S>
where
    S: SnapshotProvider + SnapshotDateIndex + ?Sized,
{
    #[must_use]
    pub const fn new(store: &'a S, classifier: StatusClassifier<'a>, base_url: &'a str) -> Self {
        Self {
            store,
            classifier,
            base_url,
        }
    }

    /// Compare the snapshots bracketing `[from, to]` for `project`.
    ///
    /// # Errors
    ///
    /// Fails when the project has no snapshots or either snapshot cannot be
    /// loaded; no partial report is produced.
    #[instrument(skip(self))]
    pub fn diff(&self, project: &str, from: NaiveDate, to: NaiveDate) -> Result<Report, SnapshotError> {
        let dates = self.store.list_dates(project)?;
        let (snapshot_from, snapshot_to) =
            resolve_snapshot_window(&dates, from, to).ok_or_else(|| SnapshotError::NoSnapshots {
                project: project.to_string(),
            })?;

        let left_epics = self.store.load_epics(snapshot_from, project)?;
        let right_epics = if snapshot_from == snapshot_to {
            None
        } else {
            Some(self.store.load_epics(snapshot_to, project)?)
        };

        let mut report = Report {
            title: from.format("%b, %Y").to_string(),
            from,
            to,
            snapshot_from,
            snapshot_to,
            left: SideCounters::default(),
            right: SideCounters::default(),
            pairs: Vec::new(),
        };

        let mut index = HashMap::new();
        self.add_side(&mut report, &mut index, &left_epics, Side::Left);
        self.add_side(
            &mut report,
            &mut index,
            right_epics.as_deref().unwrap_or(&left_epics),
            Side::Right,
        );

        debug!(
            snapshot_from = %report.snapshot_from,
            snapshot_to = %report.snapshot_to,
            pairs = report.pairs.len(),
            "built report"
        );
        Ok(report)
    }

    /// One report per calendar month of `year`, January first.
    ///
    /// # Errors
    ///
    /// Fails on the first month whose report cannot be built.
    pub fn monthly_reports(&self, project: &str, year: i32) -> Result<Vec<Report>, SnapshotError> {
        (1..=12)
            .filter_map(|month| month_window(year, month))
            .map(|(from, to)| self.diff(project, from, to))
            .collect()
    }

    fn add_side(
        &self,
        report: &mut Report,
        index: &mut HashMap<String, usize>,
        epics: &[EpicSnapshot],
        side: Side,
    ) {
        for epic in epics {
            let Some(due) = epic.due_date else {
                continue;
            };
            if due < report.from || due > report.to {
                continue;
            }

            let plan = self.plan_epic(epic);
            match side {
                Side::Left => report.left.record(&plan),
                Side::Right => report.right.record(&plan),
            }

            let slot = *index.entry(plan.key.clone()).or_insert_with(|| {
                report.pairs.push(ReportPair {
                    key: plan.key.clone(),
                    title: plan.title.clone(),
                    link: plan.link.clone(),
                    left: None,
                    right: None,
                });
                report.pairs.len() - 1
            });

            let pair = &mut report.pairs[slot];
            pair.title.clone_from(&plan.title);
            match side {
                Side::Left => pair.left = Some(plan),
                Side::Right => pair.right = Some(plan),
            }
        }
    }

    fn plan_epic(&self, epic: &EpicSnapshot) -> PlanEpic {
        let stories: Vec<PlanStory> = epic
            .issues
            .iter()
            .map(|issue| self.plan_story(epic.snapshot_date, issue))
            .collect();
        let stories_done = stories.iter().filter(|story| story.status.is_done()).count();

        PlanEpic {
            key: epic.epic.key.clone(),
            title: epic.epic.summary.clone(),
            link: browse_link(self.base_url, &epic.epic.key),
            snapshot_date: epic.snapshot_date,
            start_date: epic.start_date,
            due_date: epic.due_date,
            status: self.classifier.issue_status(&epic.epic),
            stories,
            stories_done,
        }
    }

    fn plan_story(&self, snapshot_date: NaiveDate, issue: &Issue) -> PlanStory {
        PlanStory {
            snapshot_date,
            key: issue.key.clone(),
            title: issue.summary.clone(),
            link: browse_link(self.base_url, &issue.key),
            status: self.classifier.issue_status(issue),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Side {
    Left,
    Right,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StatusNames;
    use std::collections::BTreeMap;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn names() -> StatusNames {
        StatusNames {
            done: vec!["Done".into()],
            in_progress: vec!["In Progress".into()],
            todo: vec!["To Do".into()],
        }
    }

    #[derive(Default)]
    struct MemoryStore {
        snapshots: BTreeMap<NaiveDate, Vec<EpicSnapshot>>,
    }

    impl MemoryStore {
        fn with(mut self, date: NaiveDate, epics: Vec<EpicSnapshot>) -> Self {
            self.snapshots.insert(date, epics);
            self
        }
    }

    impl SnapshotProvider for MemoryStore {
        fn load_epics(&self, date: NaiveDate, project: &str) -> Result<Vec<EpicSnapshot>, SnapshotError> {
            self.snapshots
                .get(&date)
                .cloned()
                .ok_or_else(|| SnapshotError::NotFound {
                    project: project.to_string(),
                    date,
                })
        }
    }

    impl SnapshotDateIndex for MemoryStore {
        fn list_dates(&self, _project: &str) -> Result<BTreeSet<NaiveDate>, SnapshotError> {
            Ok(self.snapshots.keys().copied().collect())
        }
    }

    fn epic(key: &str, status: &str, snapshot: NaiveDate, due: NaiveDate, stories: &[&str]) -> EpicSnapshot {
        let issues = stories
            .iter()
            .enumerate()
            .map(|(i, status)| Issue::new(format!("{key}-{i}"), "story", *status))
            .collect();
        EpicSnapshot::new(Issue::new(key, format!("Epic {key}"), status).with_due_date(due), snapshot)
            .with_issues(issues)
    }

    #[test]
    fn window_picks_bracketing_snapshots() {
        let dates: BTreeSet<_> = [date(2024, 1, 20), date(2024, 2, 3), date(2024, 2, 20), date(2024, 3, 2)]
            .into_iter()
            .collect();
        let window = resolve_snapshot_window(&dates, date(2024, 2, 1), date(2024, 2, 29));
        assert_eq!(window, Some((date(2024, 2, 3), date(2024, 2, 20))));
    }

    #[test]
    fn window_falls_back_to_latest_then_left() {
        let dates: BTreeSet<_> = [date(2024, 1, 5), date(2024, 1, 20)].into_iter().collect();
        assert_eq!(
            resolve_snapshot_window(&dates, date(2024, 2, 1), date(2024, 2, 29)),
            Some((date(2024, 1, 20), date(2024, 1, 20)))
        );

        let later: BTreeSet<_> = [date(2024, 5, 1)].into_iter().collect();
        assert_eq!(
            resolve_snapshot_window(&later, date(2024, 2, 1), date(2024, 2, 29)),
            Some((date(2024, 5, 1), date(2024, 5, 1)))
        );

        assert_eq!(resolve_snapshot_window(&BTreeSet::new(), date(2024, 2, 1), date(2024, 2, 29)), None);
    }

    #[test]
    fn month_window_handles_leap_february() {
        assert_eq!(month_window(2024, 2), Some((date(2024, 2, 1), date(2024, 2, 29))));
        assert_eq!(month_window(2023, 12), Some((date(2023, 12, 1), date(2023, 12, 31))));
        assert_eq!(month_window(2023, 13), None);
    }

    #[test]
    fn right_only_epic_is_replanned() {
        let from = date(2024, 2, 1);
        let to = date(2024, 2, 29);
        let store = MemoryStore::default()
            .with(date(2024, 2, 2), vec![epic("PLAT-1", "In Progress", date(2024, 2, 2), date(2024, 2, 20), &["Done", "To Do"])])
            .with(
                date(2024, 2, 27),
                vec![
                    epic("PLAT-1", "Done", date(2024, 2, 27), date(2024, 2, 20), &["Done", "Done"]),
                    epic("PLAT-9", "In Progress", date(2024, 2, 27), date(2024, 2, 28), &["Done", "To Do", "To Do"]),
                ],
            );
        let names = names();
        let differ = TimeWindowDiffer::new(&store, StatusClassifier::new(&names), "https://jira.test");

        let report = differ.diff("Platform", from, to).unwrap();
        assert_eq!(report.title, "Feb, 2024");
        assert_eq!(report.pairs.len(), 2);

        let carried = &report.pairs[0];
        assert_eq!(carried.key, "PLAT-1");
        assert_eq!(carried.planning_status(), PlanningStatus::Ok);
        assert!((carried.progress() - 1.0).abs() < f64::EPSILON);

        let fresh = &report.pairs[1];
        assert_eq!(fresh.key, "PLAT-9");
        assert!(!fresh.has_left());
        assert!(fresh.has_right());
        assert_eq!(fresh.planning_status(), PlanningStatus::Replanned);
        assert_eq!(fresh.left_due_label(), RESCHEDULED);
        assert_eq!(fresh.right_due_label(), "Feb 28, 2024");
        assert_eq!(fresh.link, "https://jira.test/browse/PLAT-9");
        assert!((fresh.progress() - 1.0 / 3.0).abs() < 1e-9);

        assert_eq!(
            report.left,
            SideCounters {
                epics_planned: 1,
                epics_done: 0,
                stories_planned: 2,
                stories_done: 1,
            }
        );
        assert_eq!(
            report.right,
            SideCounters {
                epics_planned: 2,
                epics_done: 1,
                stories_planned: 5,
                stories_done: 3,
            }
        );
        assert!((report.progress() - 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn epics_due_outside_window_are_excluded() {
        let snap = date(2024, 2, 10);
        let mut undated = epic("PLAT-3", "To Do", snap, date(2024, 2, 10), &[]);
        undated.due_date = None;
        let store = MemoryStore::default().with(
            snap,
            vec![
                epic("PLAT-1", "To Do", snap, date(2024, 3, 1), &["To Do"]),
                epic("PLAT-2", "To Do", snap, date(2024, 2, 29), &["To Do"]),
                undated,
            ],
        );
        let names = names();
        let differ = TimeWindowDiffer::new(&store, StatusClassifier::new(&names), "https://jira.test");

        let report = differ.diff("Platform", date(2024, 2, 1), date(2024, 2, 29)).unwrap();
        let keys: Vec<_> = report.pairs.iter().map(|pair| pair.key.as_str()).collect();
        assert_eq!(keys, vec!["PLAT-2"]);
        assert_eq!(report.snapshot_from, report.snapshot_to);
        assert_eq!(report.left, report.right);
    }

    #[test]
    fn moved_due_date_is_postponed() {
        let store = MemoryStore::default()
            .with(date(2024, 2, 1), vec![epic("PLAT-1", "In Progress", date(2024, 2, 1), date(2024, 2, 10), &[])])
            .with(date(2024, 2, 25), vec![epic("PLAT-1", "In Progress", date(2024, 2, 25), date(2024, 2, 26), &[])]);
        let names = names();
        let differ = TimeWindowDiffer::new(&store, StatusClassifier::new(&names), "https://jira.test");

        let report = differ.diff("Platform", date(2024, 2, 1), date(2024, 2, 29)).unwrap();
        assert_eq!(report.pairs[0].planning_status(), PlanningStatus::Postponed);
        assert!(report.pairs[0].progress().abs() < f64::EPSILON);
        assert!(report.progress().abs() < f64::EPSILON);
    }

    #[test]
    fn empty_index_is_an_error() {
        let store = MemoryStore::default();
        let names = names();
        let differ = TimeWindowDiffer::new(&store, StatusClassifier::new(&names), "https://jira.test");
        let err = differ.diff("Platform", date(2024, 2, 1), date(2024, 2, 29)).unwrap_err();
        assert!(matches!(err, SnapshotError::NoSnapshots { .. }));
    }

    #[test]
    fn monthly_reports_cover_the_year_in_order() {
        let snap = date(2024, 1, 15);
        let store = MemoryStore::default().with(snap, vec![epic("PLAT-1", "To Do", snap, date(2024, 6, 30), &[])]);
        let names = names();
        let differ = TimeWindowDiffer::new(&store, StatusClassifier::new(&names), "https://jira.test");

        let reports = differ.monthly_reports("Platform", 2024).unwrap();
        assert_eq!(reports.len(), 12);
        assert_eq!(reports[0].title, "Jan, 2024");
        assert_eq!(reports[11].title, "Dec, 2024");
        assert_eq!(reports[5].pairs.len(), 1);
        assert_eq!(reports[5].anchor(), "2024-06");
        assert!(reports.iter().enumerate().all(|(i, r)| i == 5 || r.pairs.is_empty()));
    }
}
