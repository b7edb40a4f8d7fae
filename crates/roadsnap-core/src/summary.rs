//! Single-snapshot bucket summary.
//!
//! Each epic lands in at most one bucket, evaluated in this order:
//!
//! 1. **Done**: epic status is done and every child is done.
//! 2. **Overdue**: past due, not fully done, and the epic is not still to-do.
//! 3. **Outstanding**: epic status is to-do.
//! 4. **Ongoing**: epic status is in progress.
//!
//! Epics matching none of the rules (e.g. an undefined status that is not
//! past due) are left out of every bucket.

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, warn};

use crate::classify::StatusClassifier;
use crate::model::{Bucket, EpicSnapshot, StatusCategory};

/// Message attached to epics whose status contradicts their planning dates.
pub const STATUS_NOT_IN_SYNC: &str = "Epic status does not correspond to planning dates";

/// Data-inconsistency signal for one epic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncWarning {
    pub key: String,
    pub message: String,
}

/// Bucketed view of a project's epics at one snapshot date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub project: String,
    pub date: NaiveDate,
    pub done: Vec<EpicSnapshot>,
    pub overdue: Vec<EpicSnapshot>,
    pub ongoing: Vec<EpicSnapshot>,
    pub outstanding: Vec<EpicSnapshot>,
    pub warnings: Vec<SyncWarning>,
}

/// Borrowed bucket with its display name, in report order.
#[derive(Debug, Clone, Copy)]
pub struct NamedBucket<'a> {
    pub bucket: Bucket,
    pub name: &'static str,
    pub epics: &'a [EpicSnapshot],
}

impl Summary {
    fn empty(project: &str, date: NaiveDate) -> Self {
        Self {
            project: project.to_string(),
            date,
            done: Vec::new(),
            overdue: Vec::new(),
            ongoing: Vec::new(),
            outstanding: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Number of epics placed in any bucket.
    #[must_use]
    pub fn all_count(&self) -> usize {
        self.done.len() + self.overdue.len() + self.ongoing.len() + self.outstanding.len()
    }

    #[must_use]
    pub fn bucket(&self, bucket: Bucket) -> &[EpicSnapshot] {
        match bucket {
            Bucket::Done => &self.done,
            Bucket::Overdue => &self.overdue,
            Bucket::Ongoing => &self.ongoing,
            Bucket::Outstanding => &self.outstanding,
        }
    }

    fn bucket_mut(&mut self, bucket: Bucket) -> &mut Vec<EpicSnapshot> {
        match bucket {
            Bucket::Done => &mut self.done,
            Bucket::Overdue => &mut self.overdue,
            Bucket::Ongoing => &mut self.ongoing,
            Bucket::Outstanding => &mut self.outstanding,
        }
    }

    /// Buckets in report order: Done, Ongoing, Overdue, To Do.
    #[must_use]
    pub fn named_stats(&self) -> Vec<NamedBucket<'_>> {
        Bucket::REPORT_ORDER
            .into_iter()
            .map(|bucket| NamedBucket {
                bucket,
                name: bucket.display_name(),
                epics: self.bucket(bucket),
            })
            .collect()
    }

    /// Bucket holding the epic with `key`, if any.
    #[must_use]
    pub fn bucket_of(&self, key: &str) -> Option<Bucket> {
        Bucket::REPORT_ORDER
            .into_iter()
            .find(|bucket| self.bucket(*bucket).iter().any(|epic| epic.key() == key))
    }

    #[must_use]
    pub fn warning_for(&self, key: &str) -> Option<&SyncWarning> {
        self.warnings.iter().find(|warning| warning.key == key)
    }
}

/// Decide the bucket for one epic, or `None` when no rule matches.
#[must_use]
pub fn assign_bucket(epic: &EpicSnapshot, classifier: &StatusClassifier<'_>) -> Option<Bucket> {
    let status = classifier.issue_status(&epic.epic);
    let all_children_done = classifier.count(epic).all_done();

    if status.is_done() && all_children_done {
        return Some(Bucket::Done);
    }

    // The first rule already returned for done epics with done children.
    if epic.is_past_due() && !status.is_to_do() {
        return Some(Bucket::Overdue);
    }

    match status {
        StatusCategory::ToDo => Some(Bucket::Outstanding),
        StatusCategory::InProgress => Some(Bucket::Ongoing),
        StatusCategory::Done | StatusCategory::Undefined => None,
    }
}

/// Warning when an epic is past due or active but still marked to-do.
#[must_use]
pub fn sync_warning(epic: &EpicSnapshot, classifier: &StatusClassifier<'_>) -> Option<SyncWarning> {
    let dates_say_started = epic.is_past_due() || epic.is_in_active_phase();
    if dates_say_started && classifier.issue_status(&epic.epic).is_to_do() {
        return Some(SyncWarning {
            key: epic.key().to_string(),
            message: STATUS_NOT_IN_SYNC.to_string(),
        });
    }
    None
}

/// Classify `epics` of `project` observed on `date` into buckets.
#[must_use]
pub fn summarize(
    project: &str,
    date: NaiveDate,
    epics: &[EpicSnapshot],
    classifier: &StatusClassifier<'_>,
) -> Summary {
    let mut summary = Summary::empty(project, date);

    for epic in epics {
        if let Some(warning) = sync_warning(epic, classifier) {
            warn!(project, epic = %warning.key, "{}", warning.message);
            summary.warnings.push(warning);
        }

        match assign_bucket(epic, classifier) {
            Some(bucket) => summary.bucket_mut(bucket).push(epic.clone()),
            None => debug!(project, epic = epic.key(), status = %epic.epic.status, "epic matches no bucket"),
        }
    }

    summary
}
