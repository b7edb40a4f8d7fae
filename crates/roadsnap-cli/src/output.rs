//! Shared output layer for pretty/text/JSON parity across all CLI commands.
//!
//! # Output mode resolution
//!
//! Precedence (highest wins):
//! 1. `--json` flag
//! 2. `FORMAT` env var → `"pretty"` | `"text"` | `"json"`
//! 3. Default: [`OutputMode::Pretty`] if stdout is a TTY; [`OutputMode::Text`] if piped.

use roadsnap_core::error::{IssueSourceError, SnapshotError};
use serde::Serialize;
use std::io::{self, IsTerminal, Write};

/// Shared width for human pretty separators.
pub const PRETTY_RULE_WIDTH: usize = 72;

/// Write a horizontal separator used by pretty human output.
pub fn pretty_rule(w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "{:-<width$}", "", width = PRETTY_RULE_WIDTH)
}

/// Write a section heading followed by a separator.
pub fn pretty_section(w: &mut dyn Write, heading: &str) -> io::Result<()> {
    writeln!(w, "{heading}")?;
    pretty_rule(w)
}

/// Render a left-aligned key/value line in human output.
pub fn pretty_kv(w: &mut dyn Write, key: &str, value: impl AsRef<str>) -> io::Result<()> {
    writeln!(w, "{:<12} {}", format!("{key}:"), value.as_ref())
}

/// The three output modes supported by the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-optimized output with sections.
    Pretty,
    /// Plain text for pipes.
    Text,
    /// Machine-readable JSON.
    Json,
}

impl OutputMode {
    #[must_use]
    pub const fn is_json(self) -> bool {
        matches!(self, Self::Json)
    }
}

fn resolve_output_mode_inner(json_flag: bool, format_env: Option<&str>, is_tty: bool) -> OutputMode {
    if json_flag {
        return OutputMode::Json;
    }

    if let Some(val) = format_env {
        match val.to_lowercase().as_str() {
            "json" => return OutputMode::Json,
            "text" => return OutputMode::Text,
            "pretty" => return OutputMode::Pretty,
            _ => {} // unknown value: fall through to TTY detection
        }
    }

    if is_tty {
        OutputMode::Pretty
    } else {
        OutputMode::Text
    }
}

/// Resolve the output mode from the `--json` flag, `FORMAT`, and TTY defaults.
pub fn resolve_output_mode(json_flag: bool) -> OutputMode {
    let env_val = std::env::var("FORMAT").ok();
    let is_tty = io::stdout().is_terminal();
    resolve_output_mode_inner(json_flag, env_val.as_deref(), is_tty)
}

/// A structured error with optional suggestion and error code.
#[derive(Debug, Serialize)]
pub struct CliError {
    /// Human-readable error message.
    pub message: String,
    /// Optional suggestion for how to fix the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    /// Machine-readable error code (e.g. "E2001").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

impl CliError {
    /// Create a simple error with just a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            suggestion: None,
            error_code: None,
        }
    }

    /// Build from any command failure, keeping snapshot and issue source codes.
    #[must_use]
    pub fn from_anyhow(err: &anyhow::Error) -> Self {
        let mut cli_error = Self::new(format!("{err:#}"));
        let code = err.chain().find_map(|cause| {
            cause
                .downcast_ref::<SnapshotError>()
                .map(SnapshotError::code)
                .or_else(|| cause.downcast_ref::<IssueSourceError>().map(IssueSourceError::code))
        });
        if let Some(code) = code {
            cli_error.error_code = Some(code.code().to_string());
            cli_error.suggestion = code.hint().map(str::to_string);
        }
        cli_error
    }
}

impl From<&SnapshotError> for CliError {
    fn from(err: &SnapshotError) -> Self {
        Self {
            message: err.to_string(),
            suggestion: err.hint().map(str::to_string),
            error_code: Some(err.code().code().to_string()),
        }
    }
}

/// Render a serializable value to stdout in the requested format.
///
/// In JSON mode, the value is serialized with `serde_json`. In pretty/text mode,
/// the provided `human_fn` closure is called to produce text output.
pub fn render<T: Serialize>(
    mode: OutputMode,
    value: &T,
    human_fn: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    render_to(&mut out, mode, value, human_fn)
}

fn render_to<T: Serialize>(
    out: &mut dyn Write,
    mode: OutputMode,
    value: &T,
    human_fn: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
) -> anyhow::Result<()> {
    match mode {
        OutputMode::Json => {
            serde_json::to_writer_pretty(&mut *out, value)?;
            writeln!(out)?;
        }
        OutputMode::Pretty | OutputMode::Text => {
            human_fn(value, out)?;
        }
    }
    Ok(())
}

/// Render an error to stderr in the requested format.
pub fn render_error(mode: OutputMode, error: &CliError) -> anyhow::Result<()> {
    let stderr = io::stderr();
    let mut out = stderr.lock();
    render_error_to(&mut out, mode, error)
}

fn render_error_to(out: &mut dyn Write, mode: OutputMode, error: &CliError) -> anyhow::Result<()> {
    match mode {
        OutputMode::Json => {
            let wrapper = serde_json::json!({
                "error": error,
            });
            serde_json::to_writer_pretty(&mut *out, &wrapper)?;
            writeln!(out)?;
        }
        OutputMode::Pretty | OutputMode::Text => {
            match &error.error_code {
                Some(code) => writeln!(out, "error[{code}]: {}", error.message)?,
                None => writeln!(out, "error: {}", error.message)?,
            }
            if let Some(ref suggestion) = error.suggestion {
                writeln!(out, "  suggestion: {suggestion}")?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn json_flag_wins_over_env() {
        assert_eq!(resolve_output_mode_inner(true, Some("pretty"), true), OutputMode::Json);
    }

    #[test]
    fn format_env_is_case_insensitive() {
        assert_eq!(resolve_output_mode_inner(false, Some("JSON"), true), OutputMode::Json);
        assert_eq!(resolve_output_mode_inner(false, Some("text"), true), OutputMode::Text);
        assert_eq!(resolve_output_mode_inner(false, Some("Pretty"), false), OutputMode::Pretty);
    }

    #[test]
    fn unknown_env_falls_through_to_tty() {
        assert_eq!(resolve_output_mode_inner(false, Some("yaml"), true), OutputMode::Pretty);
        assert_eq!(resolve_output_mode_inner(false, None, false), OutputMode::Text);
    }

    #[test]
    fn render_json_output() {
        let mut buf = Vec::new();
        render_to(&mut buf, OutputMode::Json, &serde_json::json!({"written": 2}), |_, _| Ok(())).unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(parsed["written"], 2);
    }

    #[test]
    fn render_text_uses_closure() {
        let mut buf = Vec::new();
        render_to(&mut buf, OutputMode::Text, &"Platform", |v, w| writeln!(w, "project {v}")).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "project Platform\n");
    }

    #[test]
    fn snapshot_error_keeps_code_and_hint() {
        let err = SnapshotError::NotFound {
            project: "Platform".into(),
            date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
        };
        let cli_error = CliError::from(&err);
        assert_eq!(cli_error.error_code.as_deref(), Some("E2001"));
        assert!(cli_error.suggestion.is_some());

        let wrapped = anyhow::Error::new(err).context("failed to list project Platform");
        let cli_error = CliError::from_anyhow(&wrapped);
        assert_eq!(cli_error.error_code.as_deref(), Some("E2001"));
        assert!(cli_error.message.starts_with("failed to list project Platform"));
    }

    #[test]
    fn issue_source_error_keeps_code_through_context() {
        let err = anyhow::Error::new(IssueSourceError::Request {
            url: "https://acme.atlassian.net/rest/api/2/search".into(),
            reason: "status code 401".into(),
        })
        .context("failed to fetch epics for project: Platform");

        let cli_error = CliError::from_anyhow(&err);
        assert_eq!(cli_error.error_code.as_deref(), Some("E4001"));
        assert!(cli_error.suggestion.as_deref().is_some_and(|s| s.contains("jira.base_url")));
        assert!(cli_error.message.contains("status code 401"));
    }

    #[test]
    fn render_error_human_and_json() {
        let error = CliError {
            message: "no snapshots".into(),
            suggestion: Some("run rsnap cache".into()),
            error_code: Some("E2002".into()),
        };

        let mut human = Vec::new();
        render_error_to(&mut human, OutputMode::Pretty, &error).unwrap();
        let human = String::from_utf8(human).unwrap();
        assert!(human.starts_with("error[E2002]: no snapshots"));
        assert!(human.contains("suggestion: run rsnap cache"));

        let mut json = Vec::new();
        render_error_to(&mut json, OutputMode::Json, &error).unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&json).unwrap();
        assert_eq!(parsed["error"]["error_code"], "E2002");
    }

    #[test]
    fn plain_error_has_no_code() {
        let mut out = Vec::new();
        render_error_to(&mut out, OutputMode::Text, &CliError::new("boom")).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "error: boom\n");
    }
}
