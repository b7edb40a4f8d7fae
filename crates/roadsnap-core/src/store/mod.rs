//! Recorded snapshots on disk.
//!
//! Layout under the work directory:
//!
//! ```text
//! <dir>/<ProjectNoSpaces>/<YYYY-MM-DD>/raw_data/epics.json
//! <dir>/<ProjectNoSpaces>/<YYYY-MM-DD>/raw_data/issues_<EPIC-KEY>.json
//! ```
//!
//! Both files hold the issue records exactly as returned by the issue source.

pub mod raw;

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::error::SnapshotError;
use crate::model::EpicSnapshot;

use self::raw::{RawIssue, parse_issues};

/// Directory-name date format of snapshots.
pub const SNAPSHOT_DATE_FORMAT: &str = "%Y-%m-%d";

const RAW_DATA_DIR: &str = "raw_data";
const EPICS_FILE: &str = "epics.json";

/// Loads the epics recorded for one project on one date.
pub trait SnapshotProvider {
    /// Epics sorted by due date ascending, unset due dates first.
    ///
    /// # Errors
    ///
    /// `NotFound` when nothing was recorded for `date`, `CorruptData` or
    /// `MissingIssues` when the recorded data is unusable.
    fn load_epics(&self, date: NaiveDate, project: &str) -> Result<Vec<EpicSnapshot>, SnapshotError>;
}

/// Lists the dates for which a project has a snapshot.
pub trait SnapshotDateIndex {
    /// # Errors
    ///
    /// Fails only when the store itself cannot be read. An unknown project
    /// has no dates.
    fn list_dates(&self, project: &str) -> Result<BTreeSet<NaiveDate>, SnapshotError>;
}

/// Recorded snapshot dates of one project directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectSnapshots {
    pub project: String,
    pub dates: Vec<NaiveDate>,
}

/// Project directory name: the project name without spaces.
#[must_use]
pub fn project_dir_name(project: &str) -> String {
    project.replace(' ', "")
}

fn read_error(path: &Path) -> impl FnOnce(io::Error) -> SnapshotError + '_ {
    move |source| SnapshotError::Read {
        path: path.to_path_buf(),
        source,
    }
}

fn write_error(path: &Path) -> impl FnOnce(io::Error) -> SnapshotError + '_ {
    move |source| SnapshotError::Write {
        path: path.to_path_buf(),
        source,
    }
}

/// Filesystem-backed snapshot store.
#[derive(Debug, Clone)]
pub struct FsSnapshotStore {
    root: PathBuf,
    start_date_field: Option<String>,
}

impl FsSnapshotStore {
    /// `start_date_field` names the custom field holding epic start dates;
    /// without it every start date is unset.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, start_date_field: Option<String>) -> Self {
        Self {
            root: root.into(),
            start_date_field,
        }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn project_dir(&self, project: &str) -> PathBuf {
        self.root.join(project_dir_name(project))
    }

    #[must_use]
    pub fn snapshot_dir(&self, project: &str, date: NaiveDate) -> PathBuf {
        self.project_dir(project)
            .join(date.format(SNAPSHOT_DATE_FORMAT).to_string())
    }

    fn raw_dir(&self, project: &str, date: NaiveDate) -> PathBuf {
        self.snapshot_dir(project, date).join(RAW_DATA_DIR)
    }

    #[must_use]
    pub fn epics_path(&self, project: &str, date: NaiveDate) -> PathBuf {
        self.raw_dir(project, date).join(EPICS_FILE)
    }

    #[must_use]
    pub fn issues_path(&self, project: &str, date: NaiveDate, epic_key: &str) -> PathBuf {
        self.raw_dir(project, date).join(format!("issues_{epic_key}.json"))
    }

    /// Record the epic list of `project` for `date`.
    ///
    /// # Errors
    ///
    /// Returns `Write` when the directory or file cannot be written.
    pub fn save_epics(&self, project: &str, date: NaiveDate, epics: &[Value]) -> Result<PathBuf, SnapshotError> {
        let path = self.epics_path(project, date);
        write_records(&path, epics)?;
        debug!(path = %path.display(), epics = epics.len(), "saved epics");
        Ok(path)
    }

    /// Record the child issues of `epic_key` for `date`.
    ///
    /// # Errors
    ///
    /// Returns `Write` when the directory or file cannot be written.
    pub fn save_issues(
        &self,
        project: &str,
        date: NaiveDate,
        epic_key: &str,
        issues: &[Value],
    ) -> Result<PathBuf, SnapshotError> {
        let path = self.issues_path(project, date, epic_key);
        write_records(&path, issues)?;
        debug!(path = %path.display(), issues = issues.len(), "saved issues");
        Ok(path)
    }

    /// Every project directory with at least one snapshot, sorted by name.
    ///
    /// # Errors
    ///
    /// Returns `Read` when the work directory cannot be listed.
    pub fn list_projects(&self) -> Result<Vec<ProjectSnapshots>, SnapshotError> {
        let mut projects = Vec::new();

        for dir in subdirectories(&self.root)? {
            let Some(name) = dir.file_name().and_then(|name| name.to_str()) else {
                continue;
            };
            let dates = dates_in(&dir)?;
            if dates.is_empty() {
                continue;
            }
            projects.push(ProjectSnapshots {
                project: name.to_string(),
                dates: dates.into_iter().collect(),
            });
        }

        projects.sort_by(|a, b| a.project.cmp(&b.project));
        Ok(projects)
    }

    fn read(path: &Path) -> Result<String, SnapshotError> {
        fs::read_to_string(path).map_err(read_error(path))
    }

    fn to_snapshot(&self, raw: &RawIssue, path: &Path, date: NaiveDate) -> Result<EpicSnapshot, SnapshotError> {
        let mut snapshot = EpicSnapshot::new(raw.to_issue(), date);
        if let Some(field) = self.start_date_field.as_deref() {
            snapshot.start_date = raw.date_field(field).map_err(|reason| SnapshotError::CorruptData {
                path: path.to_path_buf(),
                reason,
            })?;
        }
        Ok(snapshot)
    }
}

impl SnapshotProvider for FsSnapshotStore {
    #[instrument(skip(self))]
    fn load_epics(&self, date: NaiveDate, project: &str) -> Result<Vec<EpicSnapshot>, SnapshotError> {
        let epics_path = self.epics_path(project, date);
        if !epics_path.is_file() {
            return Err(SnapshotError::NotFound {
                project: project.to_string(),
                date,
            });
        }

        let raw_epics = parse_issues(&epics_path, &Self::read(&epics_path)?)?;
        let mut epics = Vec::with_capacity(raw_epics.len());

        for raw in &raw_epics {
            let mut snapshot = self.to_snapshot(raw, &epics_path, date)?;

            let issues_path = self.issues_path(project, date, &raw.key);
            if !issues_path.is_file() {
                return Err(SnapshotError::MissingIssues {
                    epic: raw.key.clone(),
                    path: issues_path,
                });
            }
            snapshot.issues = parse_issues(&issues_path, &Self::read(&issues_path)?)?
                .iter()
                .map(RawIssue::to_issue)
                .collect();

            epics.push(snapshot);
        }

        epics.sort_by_key(|epic| epic.due_date);
        debug!(epics = epics.len(), "loaded snapshot");
        Ok(epics)
    }
}

impl SnapshotDateIndex for FsSnapshotStore {
    fn list_dates(&self, project: &str) -> Result<BTreeSet<NaiveDate>, SnapshotError> {
        dates_in(&self.project_dir(project))
    }
}

fn write_records(path: &Path, records: &[Value]) -> Result<(), SnapshotError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(write_error(parent))?;
    }
    let body = serde_json::to_string_pretty(records).map_err(|err| SnapshotError::CorruptData {
        path: path.to_path_buf(),
        reason: err.to_string(),
    })?;
    fs::write(path, body).map_err(write_error(path))
}

fn subdirectories(dir: &Path) -> Result<Vec<PathBuf>, SnapshotError> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(read_error(dir)(err)),
    };

    let mut dirs = Vec::new();
    for entry in entries {
        let path = entry.map_err(read_error(dir))?.path();
        if path.is_dir() {
            dirs.push(path);
        }
    }
    Ok(dirs)
}

/// Snapshot dates under a project directory: `YYYY-MM-DD` dirs holding raw data.
fn dates_in(project_dir: &Path) -> Result<BTreeSet<NaiveDate>, SnapshotError> {
    let mut dates = BTreeSet::new();

    for dir in subdirectories(project_dir)? {
        let Some(name) = dir.file_name().and_then(|name| name.to_str()) else {
            continue;
        };
        let Ok(date) = NaiveDate::parse_from_str(name, SNAPSHOT_DATE_FORMAT) else {
            debug!(dir = %dir.display(), "skipping non-snapshot directory");
            continue;
        };
        if dir.join(RAW_DATA_DIR).is_dir() {
            dates.insert(date);
        }
    }

    Ok(dates)
}
