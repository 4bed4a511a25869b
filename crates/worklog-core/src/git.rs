//! Git plumbing: thin wrappers over the `git` binary.
//!
//! The store shells out rather than binding libgit2; every helper maps a
//! non-zero exit into `StoreError::Unavailable` with the trimmed stderr.

use std::path::Path;
use std::process::{Command, Stdio};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::error::{Result, StoreError};

/// One commit touching a record file, as returned by `history`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitInfo {
    pub sha: String,
    pub author: String,
    pub date: DateTime<Utc>,
    pub message: String,
}

pub(crate) fn run_git(repo: &Path, args: &[&str]) -> Result<String> {
    debug!(?args, repo = %repo.display(), "git");
    let output = Command::new("git")
        .args(args)
        .current_dir(repo)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| StoreError::unavailable("git", format!("failed to spawn git: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(StoreError::unavailable("git", stderr.trim().to_string()));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

pub(crate) fn init(repo: &Path) -> Result<()> {
    run_git(repo, &["init", "--quiet"]).map(|_| ())
}

pub(crate) fn set_config(repo: &Path, key: &str, value: &str) -> Result<()> {
    run_git(repo, &["config", key, value]).map(|_| ())
}

pub(crate) fn stage(repo: &Path, pathspec: &str) -> Result<()> {
    run_git(repo, &["add", "--all", "--", pathspec]).map(|_| ())
}

/// Commit whatever is staged. Exactly one call per logical mutation.
pub(crate) fn commit(repo: &Path, message: &str) -> Result<()> {
    run_git(repo, &["commit", "--quiet", "-m", message]).map(|_| ())
}

/// Commit history for one file, newest first.
///
/// Uses unit separators in the format string so messages and authors may
/// contain anything short of a control character.
pub(crate) fn file_log(repo: &Path, rel_path: &str, limit: usize) -> Result<Vec<CommitInfo>> {
    let max = format!("--max-count={limit}");
    let stdout = run_git(
        repo,
        &[
            "log",
            &max,
            "--format=%H%x1f%an%x1f%aI%x1f%s",
            "--",
            rel_path,
        ],
    )?;

    let mut commits = Vec::new();
    for line in stdout.lines() {
        let mut parts = line.split('\u{1f}');
        let (Some(sha), Some(author), Some(date), Some(message)) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(StoreError::unavailable(
                "git log",
                format!("unexpected log line: {line}"),
            ));
        };
        let date = DateTime::parse_from_rfc3339(date)
            .map_err(|e| StoreError::unavailable("git log", format!("bad commit date: {e}")))?
            .with_timezone(&Utc);
        commits.push(CommitInfo {
            sha: sha.to_string(),
            author: author.to_string(),
            date,
            message: message.to_string(),
        });
    }
    Ok(commits)
}
