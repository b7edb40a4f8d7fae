use std::fmt;
use std::io;
use std::path::PathBuf;

use chrono::NaiveDate;

/// Machine-readable error codes for scripts and JSON output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigNotFound,
    ConfigParseError,
    StatusNamesMissing,
    SnapshotNotFound,
    NoSnapshots,
    CorruptSnapshot,
    MissingIssues,
    SnapshotReadFailed,
    SnapshotWriteFailed,
    IssueSourceFailed,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ConfigNotFound => "E1001",
            Self::ConfigParseError => "E1002",
            Self::StatusNamesMissing => "E1003",
            Self::SnapshotNotFound => "E2001",
            Self::NoSnapshots => "E2002",
            Self::CorruptSnapshot => "E2003",
            Self::MissingIssues => "E2004",
            Self::SnapshotReadFailed => "E2005",
            Self::SnapshotWriteFailed => "E3001",
            Self::IssueSourceFailed => "E4001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ConfigNotFound => "Config file not found",
            Self::ConfigParseError => "Config file parse error",
            Self::StatusNamesMissing => "Status name table is empty",
            Self::SnapshotNotFound => "Snapshot not found",
            Self::NoSnapshots => "Project has no snapshots",
            Self::CorruptSnapshot => "Snapshot record could not be parsed",
            Self::MissingIssues => "Epic issues missing from snapshot",
            Self::SnapshotReadFailed => "Snapshot read failed",
            Self::SnapshotWriteFailed => "Snapshot write failed",
            Self::IssueSourceFailed => "Issue source request failed",
        }
    }

    /// Optional remediation hint that can be surfaced to operators.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ConfigNotFound => Some("Pass --config or create rsnap-config.toml in the work dir."),
            Self::ConfigParseError => Some("Fix syntax in the config file and retry."),
            Self::StatusNamesMissing => {
                Some("Fill [status_names] done/progress/todo in the config file.")
            }
            Self::SnapshotNotFound | Self::NoSnapshots => {
                Some("Run `rsnap cache` to record a snapshot first.")
            }
            Self::CorruptSnapshot | Self::MissingIssues => {
                Some("Delete the damaged snapshot directory and re-run `rsnap cache`.")
            }
            Self::SnapshotReadFailed => Some("Check read permissions on the work directory."),
            Self::SnapshotWriteFailed => Some("Check disk space and write permissions."),
            Self::IssueSourceFailed => Some("Check jira.base_url and credentials, then retry."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Errors raised while reading or writing recorded snapshots.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    /// No snapshot was recorded for the requested project and date.
    #[error("no snapshot for project '{project}' at {date}")]
    NotFound { project: String, date: NaiveDate },

    /// The project has no snapshot dates at all.
    #[error("no snapshots recorded for project '{project}'")]
    NoSnapshots { project: String },

    /// A stored record exists but cannot be parsed.
    #[error("corrupt snapshot record {}: {reason}", path.display())]
    CorruptData { path: PathBuf, reason: String },

    /// An epic was recorded without its child-issue record.
    #[error("issues for epic {epic} missing at {}", path.display())]
    MissingIssues { epic: String, path: PathBuf },

    /// Reading a recorded snapshot or listing its directories failed.
    #[error("failed to read snapshot data at {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Recording a snapshot failed.
    #[error("failed to write snapshot data at {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl SnapshotError {
    /// Machine-readable code associated with this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::NotFound { .. } => ErrorCode::SnapshotNotFound,
            Self::NoSnapshots { .. } => ErrorCode::NoSnapshots,
            Self::CorruptData { .. } => ErrorCode::CorruptSnapshot,
            Self::MissingIssues { .. } => ErrorCode::MissingIssues,
            Self::Read { .. } => ErrorCode::SnapshotReadFailed,
            Self::Write { .. } => ErrorCode::SnapshotWriteFailed,
        }
    }

    /// Optional remediation hint for operators.
    #[must_use]
    pub const fn hint(&self) -> Option<&'static str> {
        self.code().hint()
    }
}

/// Errors raised while fetching records from the issue source.
#[derive(Debug, thiserror::Error)]
pub enum IssueSourceError {
    /// The request could not be sent or returned an error status.
    #[error("issue source request failed for {url}: {reason}")]
    Request { url: String, reason: String },

    /// The response body was not the expected JSON.
    #[error("unreadable issue source response from {url}: {reason}")]
    Decode { url: String, reason: String },
}

impl IssueSourceError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        ErrorCode::IssueSourceFailed
    }
}
