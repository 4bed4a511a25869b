//! `wl status` — move an item through the status workflow.

use clap::Args;
use worklog_core::WorklogStore;
use worklog_core::model::backlog::Status;

use crate::output::{OutputMode, fail, render, write_item};

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Backlog item ID.
    pub id: String,

    /// Target status: todo, in_progress, review, done, blocked, cancelled.
    pub status: Status,
}

pub fn run_status(args: &StatusArgs, store: &WorklogStore, output: OutputMode) -> anyhow::Result<()> {
    match store.update_status(&args.id, args.status) {
        Ok(item) => render(output, &item, |item, w| write_item(w, item)),
        Err(e) => Err(fail(output, e)),
    }
}
