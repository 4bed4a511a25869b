//! `wl delete` — archive (default) or permanently delete an item.

use clap::Args;
use worklog_core::WorklogStore;

use crate::output::{OutputMode, fail, render_success};

#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Backlog item ID.
    pub id: String,

    /// Remove the record entirely instead of archiving it.
    #[arg(long)]
    pub permanent: bool,
}

pub fn run_delete(args: &DeleteArgs, store: &WorklogStore, output: OutputMode) -> anyhow::Result<()> {
    match store.delete_backlog(&args.id, !args.permanent) {
        Ok(_) => {
            let verb = if args.permanent { "deleted" } else { "archived" };
            render_success(output, &format!("{verb} backlog {}", args.id))?;
            Ok(())
        }
        Err(e) => Err(fail(output, e)),
    }
}
