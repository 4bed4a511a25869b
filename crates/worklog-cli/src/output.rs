//! Shared output layer for human/JSON parity across all CLI commands.
//!
//! Every command handler receives an [`OutputMode`] and formats its output
//! accordingly: readable text for humans, stable JSON for scripts and agents.

use serde::Serialize;
use std::io::{self, Write};
use worklog_core::StoreError;
use worklog_core::model::backlog::BacklogItem;

/// The two output modes supported by the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Human-readable text.
    #[default]
    Human,
    /// Machine-readable JSON (one object or array per command).
    Json,
}

impl OutputMode {
    /// Returns `true` if JSON output was requested.
    pub fn is_json(self) -> bool {
        matches!(self, Self::Json)
    }
}

/// Resolve the output mode from the `--json` flag and the user config.
///
/// The flag wins; otherwise `output = "json"` in the user config applies;
/// otherwise human output.
pub fn resolve_output_mode(json_flag: bool, config_output: Option<&str>) -> OutputMode {
    if json_flag || config_output.is_some_and(|v| v.eq_ignore_ascii_case("json")) {
        OutputMode::Json
    } else {
        OutputMode::Human
    }
}

/// A structured error with optional suggestion and error code.
#[derive(Debug, Serialize)]
pub struct CliError {
    /// Human-readable error message.
    pub message: String,
    /// Optional suggestion for how to fix the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    /// Machine-readable error code (e.g. "E2002").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

impl From<&StoreError> for CliError {
    fn from(err: &StoreError) -> Self {
        Self {
            message: err.to_string(),
            suggestion: err.hint().map(str::to_string),
            error_code: Some(err.code().code().to_string()),
        }
    }
}

/// Render a serializable value to stdout in the requested format.
///
/// In JSON mode the value is serialized with `serde_json`; in human mode the
/// provided closure produces text output.
pub fn render<T: Serialize>(
    mode: OutputMode,
    value: &T,
    human_fn: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match mode {
        OutputMode::Json => {
            serde_json::to_writer_pretty(&mut out, value)?;
            writeln!(out)?;
        }
        OutputMode::Human => human_fn(value, &mut out)?,
    }
    Ok(())
}

/// Render an error to stderr in the requested format.
pub fn render_error(mode: OutputMode, error: &CliError) -> anyhow::Result<()> {
    let stderr = io::stderr();
    let mut out = stderr.lock();
    match mode {
        OutputMode::Json => {
            let wrapper = serde_json::json!({ "error": error });
            serde_json::to_writer_pretty(&mut out, &wrapper)?;
            writeln!(out)?;
        }
        OutputMode::Human => {
            writeln!(out, "error: {}", error.message)?;
            if let Some(ref suggestion) = error.suggestion {
                writeln!(out, "  suggestion: {suggestion}")?;
            }
        }
    }
    Ok(())
}

/// Render a success message to stdout.
pub fn render_success(mode: OutputMode, message: &str) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match mode {
        OutputMode::Json => {
            let wrapper = serde_json::json!({ "ok": true, "message": message });
            serde_json::to_writer_pretty(&mut out, &wrapper)?;
            writeln!(out)?;
        }
        OutputMode::Human => writeln!(out, "✓ {message}")?,
    }
    Ok(())
}

/// Render a core error to stderr, then return it for the exit status.
pub fn fail(mode: OutputMode, err: StoreError) -> anyhow::Error {
    if let Err(render_err) = render_error(mode, &CliError::from(&err)) {
        return render_err;
    }
    anyhow::Error::new(err)
}

/// Write a backlog item as a compact one-record block.
pub fn write_item(w: &mut dyn Write, item: &BacklogItem) -> io::Result<()> {
    writeln!(w, "{}  {}", item.id, item.title)?;
    writeln!(w, "  status: {}  priority: {}", item.status, item.priority)?;
    if let Some(ref assignee) = item.assignee {
        writeln!(w, "  assignee: {assignee}")?;
    }
    if !item.tags.is_empty() {
        writeln!(w, "  tags: {}", item.tags.join(", "))?;
    }
    if let Some(due) = item.due_date {
        writeln!(w, "  due: {due}")?;
    }
    if item.archived {
        writeln!(w, "  archived: yes")?;
    }
    Ok(())
}

/// Write a backlog item as a single row for listings.
pub fn write_item_row(w: &mut dyn Write, item: &BacklogItem) -> io::Result<()> {
    writeln!(
        w,
        "{}  {:<11}  P{}  {}",
        item.id, item.status, item.priority, item.title
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use worklog_core::model::RecordKind;

    #[test]
    fn json_flag_wins() {
        assert!(resolve_output_mode(true, None).is_json());
        assert!(resolve_output_mode(true, Some("human")).is_json());
    }

    #[test]
    fn config_output_applies_without_flag() {
        assert!(resolve_output_mode(false, Some("json")).is_json());
        assert!(resolve_output_mode(false, Some("JSON")).is_json());
        assert!(!resolve_output_mode(false, Some("human")).is_json());
        assert!(!resolve_output_mode(false, None).is_json());
    }

    #[test]
    fn cli_error_carries_code_and_hint() {
        let err = StoreError::NotFound {
            kind: RecordKind::Backlog,
            id: "a1b2c3d4".to_string(),
        };
        let cli = CliError::from(&err);
        assert!(cli.message.contains("a1b2c3d4"));
        assert_eq!(cli.error_code.as_deref(), Some("E2002"));
    }

    #[test]
    fn item_block_lists_optional_fields_only_when_set() {
        use worklog_core::model::backlog::BacklogDraft;

        let item = BacklogItem::from_draft(
            BacklogDraft {
                title: "Fix auth".to_string(),
                tags: vec!["auth".to_string()],
                ..BacklogDraft::default()
            },
            "a1b2c3d4".to_string(),
            chrono::Utc::now(),
        )
        .expect("valid");

        let mut buf = Vec::new();
        write_item(&mut buf, &item).expect("write");
        let text = String::from_utf8(buf).expect("utf8");
        assert!(text.contains("a1b2c3d4  Fix auth"));
        assert!(text.contains("tags: auth"));
        assert!(!text.contains("assignee"));
        assert!(!text.contains("archived"));
    }
}
