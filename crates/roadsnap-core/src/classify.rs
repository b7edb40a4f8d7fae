//! Raw status label → [`StatusCategory`] mapping.

use crate::config::StatusNames;
use crate::model::{EpicSnapshot, Issue, StatusCategory};

/// Classify `raw_label` against the configured status names.
///
/// Matching is exact. A label configured under several categories resolves
/// as Done > InProgress > ToDo; an unknown label is `Undefined`.
#[must_use]
pub fn classify(raw_label: &str, names: &StatusNames) -> StatusCategory {
    let candidates = [
        (StatusCategory::Done, &names.done),
        (StatusCategory::InProgress, &names.in_progress),
        (StatusCategory::ToDo, &names.todo),
    ];

    candidates
        .into_iter()
        .find(|(_, labels)| labels.iter().any(|label| label == raw_label))
        .map_or(StatusCategory::Undefined, |(category, _)| category)
}

/// Per-category counts of an epic's child issues.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct StatusCounts {
    pub total: usize,
    pub done: usize,
    pub in_progress: usize,
    pub todo: usize,
}

impl StatusCounts {
    /// Share of done issues; `0.0` for an epic without issues.
    #[must_use]
    pub fn progress(self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        let ratio = self.done as f64 / self.total as f64;
        ratio
    }

    #[must_use]
    pub const fn all_done(self) -> bool {
        self.done == self.total
    }
}

/// Borrowing classifier bound to one status-name table.
#[derive(Debug, Clone, Copy)]
pub struct StatusClassifier<'a> {
    names: &'a StatusNames,
}

impl<'a> StatusClassifier<'a> {
    #[must_use]
    pub const fn new(names: &'a StatusNames) -> Self {
        Self { names }
    }

    #[must_use]
    pub fn status(&self, raw_label: &str) -> StatusCategory {
        classify(raw_label, self.names)
    }

    #[must_use]
    pub fn issue_status(&self, issue: &Issue) -> StatusCategory {
        self.status(&issue.status)
    }

    /// Count children by category. Undefined children only add to `total`.
    #[must_use]
    pub fn count(&self, epic: &EpicSnapshot) -> StatusCounts {
        let mut counts = StatusCounts {
            total: epic.issues.len(),
            ..StatusCounts::default()
        };

        for issue in &epic.issues {
            match self.issue_status(issue) {
                StatusCategory::Done => counts.done += 1,
                StatusCategory::InProgress => counts.in_progress += 1,
                StatusCategory::ToDo => counts.todo += 1,
                StatusCategory::Undefined => {}
            }
        }

        counts
    }
}
