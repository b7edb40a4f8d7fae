//! Point-in-time view of an epic and its child issues.
//!
//! Date predicates follow one policy for missing planning fields: any
//! comparison against an unset date is false. An epic without a due date is
//! never past due, and an epic without a start date is neither pre-start nor
//! in its active phase.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::issue::Issue;

/// An epic as observed on `snapshot_date`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpicSnapshot {
    pub epic: Issue,
    pub issues: Vec<Issue>,
    pub snapshot_date: NaiveDate,
    pub start_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
}

impl EpicSnapshot {
    /// Build a snapshot; the due date is taken from the epic record.
    #[must_use]
    pub fn new(epic: Issue, snapshot_date: NaiveDate) -> Self {
        let due_date = epic.due_date;
        Self {
            epic,
            issues: Vec::new(),
            snapshot_date,
            start_date: None,
            due_date,
        }
    }

    #[must_use]
    pub fn with_start_date(mut self, start_date: NaiveDate) -> Self {
        self.start_date = Some(start_date);
        self
    }

    #[must_use]
    pub fn with_issues(mut self, issues: Vec<Issue>) -> Self {
        self.issues = issues;
        self
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.epic.key
    }

    /// `snapshot_date > due_date`.
    #[must_use]
    pub fn is_past_due(&self) -> bool {
        self.due_date.is_some_and(|due| self.snapshot_date > due)
    }

    /// `snapshot_date < start_date`.
    #[must_use]
    pub fn is_pre_start(&self) -> bool {
        self.start_date.is_some_and(|start| self.snapshot_date < start)
    }

    /// Started on the snapshot date, or strictly between start and due.
    #[must_use]
    pub fn is_in_active_phase(&self) -> bool {
        let Some(start) = self.start_date else {
            return false;
        };

        if self.snapshot_date == start {
            return true;
        }

        self.snapshot_date > start && self.due_date.is_some_and(|due| self.snapshot_date < due)
    }
}
