//! `wl history` — commit history for one record.

use clap::Args;
use std::io::Write;
use worklog_core::WorklogStore;
use worklog_core::model::RecordKind;

use crate::output::{OutputMode, fail, render};

#[derive(Args, Debug)]
pub struct HistoryArgs {
    /// Record ID (backlog item ID or meeting file key).
    pub id: String,

    /// Record kind: backlog or meeting.
    #[arg(short, long, default_value = "backlog")]
    pub kind: RecordKind,

    /// Maximum commits to show.
    #[arg(short = 'n', long, default_value = "20")]
    pub limit: usize,
}

pub fn run_history(
    args: &HistoryArgs,
    store: &WorklogStore,
    output: OutputMode,
) -> anyhow::Result<()> {
    match store.history(args.kind, &args.id, args.limit) {
        Ok(commits) => render(output, &commits, |commits, w| {
            for commit in commits {
                writeln!(
                    w,
                    "{}  {}  {}  {}",
                    &commit.sha[..7.min(commit.sha.len())],
                    commit.date.format("%Y-%m-%d %H:%M"),
                    commit.author,
                    commit.message
                )?;
            }
            writeln!(w, "{} commits", commits.len())
        }),
        Err(e) => Err(fail(output, e)),
    }
}
