//! Due-date drift detection across snapshots.

use std::collections::{BTreeSet, HashMap};

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::error::SnapshotError;
use crate::model::{PlanningStatus, StatusCategory};
use crate::store::SnapshotProvider;

/// Due date recorded for an epic in one past snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoricDueDate {
    pub key: String,
    pub snapshot_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
}

/// Due-date history grouped by epic key.
pub type DueDateHistory = HashMap<String, Vec<HistoricDueDate>>;

fn before(a: Option<NaiveDate>, b: Option<NaiveDate>) -> bool {
    matches!((a, b), (Some(a), Some(b)) if a < b)
}

fn after(a: Option<NaiveDate>, b: Option<NaiveDate>) -> bool {
    matches!((a, b), (Some(a), Some(b)) if a > b)
}

/// Evaluate an epic's planning status from its dates and due-date history.
///
/// The latest recorded due date (by snapshot date) is compared first: an
/// earlier historic due date means the deadline was postponed, a later one
/// that it was advanced. Only an unchanged deadline (or no history) falls
/// through to the overdue check.
#[must_use]
pub fn evaluate_planning(
    status: StatusCategory,
    snapshot_date: NaiveDate,
    start_date: Option<NaiveDate>,
    due_date: Option<NaiveDate>,
    history: &[HistoricDueDate],
) -> PlanningStatus {
    if let Some(latest) = history.iter().max_by_key(|entry| entry.snapshot_date) {
        if before(latest.due_date, due_date) {
            return PlanningStatus::Postponed;
        }
        if after(latest.due_date, due_date) {
            return PlanningStatus::Advanced;
        }
    }

    let past_due = after(Some(snapshot_date), due_date);
    let late_start = status.is_to_do() && after(Some(snapshot_date), start_date);

    if (past_due && !status.is_done()) || late_start {
        PlanningStatus::Overdue
    } else {
        PlanningStatus::Ok
    }
}

/// Compare the due dates on the two sides of a report pair.
///
/// A missing side means the epic was created, removed, or moved out of the
/// reporting window in between.
#[must_use]
pub fn pair_planning_status(left_due: Option<Option<NaiveDate>>, right_due: Option<Option<NaiveDate>>) -> PlanningStatus {
    let (Some(left), Some(right)) = (left_due, right_due) else {
        return PlanningStatus::Replanned;
    };

    if before(left, right) {
        PlanningStatus::Postponed
    } else if after(left, right) {
        PlanningStatus::Advanced
    } else {
        PlanningStatus::Ok
    }
}

/// Load every snapshot in `dates` and record each epic's due date per snapshot.
#[instrument(skip(provider, dates), fields(snapshots = dates.len()))]
pub fn collect_due_date_history<P: SnapshotProvider + ?Sized>(
    provider: &P,
    project: &str,
    dates: &BTreeSet<NaiveDate>,
) -> Result<DueDateHistory, SnapshotError> {
    let mut history = DueDateHistory::new();

    for date in dates {
        let epics = provider.load_epics(*date, project)?;
        for epic in epics {
            history.entry(epic.key().to_string()).or_default().push(HistoricDueDate {
                key: epic.key().to_string(),
                snapshot_date: *date,
                due_date: epic.due_date,
            });
        }
    }

    debug!(epics = history.len(), "collected due-date history");
    Ok(history)
}

/// Entries of `history` recorded strictly before `snapshot_date`.
#[must_use]
pub fn history_before(history: &[HistoricDueDate], snapshot_date: NaiveDate) -> Vec<HistoricDueDate> {
    history
        .iter()
        .filter(|entry| entry.snapshot_date < snapshot_date)
        .cloned()
        .collect()
}
