pub mod cache;
pub mod chart;
pub mod completions;
pub mod list;
pub mod report;

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use roadsnap_core::classify::StatusClassifier;
use roadsnap_core::config::{self, Config};
use roadsnap_core::store::FsSnapshotStore;
use tracing::{debug, warn};

use crate::output::OutputMode;

/// Shared state for commands that read the config file.
pub struct Context {
    pub dir: PathBuf,
    pub config: Config,
    pub output: OutputMode,
    pub interactive: bool,
}

impl Context {
    /// Load the config from `config_path`, or `rsnap-config.toml` under `dir`.
    pub fn load(dir: PathBuf, config_path: Option<&Path>, output: OutputMode, interactive: bool) -> Result<Self> {
        let path = config_path.map_or_else(|| dir.join(config::DEFAULT_FILE_NAME), Path::to_path_buf);
        debug!(path = %path.display(), "loading config");
        let config = config::load_config(&path)?;

        for warning in config.status_names.validate() {
            warn!("{warning}");
        }

        Ok(Self {
            dir,
            config,
            output,
            interactive,
        })
    }

    pub fn store(&self) -> FsSnapshotStore {
        FsSnapshotStore::new(
            &self.dir,
            self.config.epic.start_date_field().map(str::to_string),
        )
    }

    pub const fn classifier(&self) -> StatusClassifier<'_> {
        StatusClassifier::new(&self.config.status_names)
    }

    pub fn base_url(&self) -> &str {
        &self.config.jira.base_url
    }
}

/// Write a generated report, creating parent directories.
pub fn write_report(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))
}

/// Read comma-separated indices from one line of `input`.
///
/// Each index is checked against the matching entry of `bounds`.
pub fn read_picks(input: &mut dyn BufRead, bounds: &[usize]) -> Result<Vec<usize>> {
    let mut line = String::new();
    input.read_line(&mut line).context("failed to read selection")?;

    let picks = line
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<usize>()
                .with_context(|| format!("invalid selection '{part}': expected a number"))
        })
        .collect::<Result<Vec<_>>>()?;

    if picks.len() != bounds.len() {
        anyhow::bail!("expected {} comma-separated numbers, got {}", bounds.len(), picks.len());
    }

    for (pick, bound) in picks.iter().zip(bounds) {
        if pick >= bound {
            anyhow::bail!("selection {pick} out of range (0..{bound})");
        }
    }

    Ok(picks)
}

/// Print `prompt` to stderr and read picks from stdin.
pub fn prompt_picks(prompt: &str, bounds: &[usize]) -> Result<Vec<usize>> {
    let mut err = io::stderr();
    write!(err, "\n> {prompt}: ")?;
    err.flush()?;
    read_picks(&mut io::stdin().lock(), bounds)
}
