//! `wl show` — show one backlog item.

use clap::Args;
use std::io::Write;
use worklog_core::WorklogStore;

use crate::output::{OutputMode, fail, render};

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Backlog item ID.
    pub id: String,
}

pub fn run_show(args: &ShowArgs, store: &WorklogStore, output: OutputMode) -> anyhow::Result<()> {
    match store.get_backlog(&args.id) {
        Ok(item) => render(output, &item, |item, w| {
            crate::output::write_item(w, item)?;
            if !item.description.is_empty() {
                writeln!(w)?;
                writeln!(w, "{}", item.description)?;
            }
            writeln!(w)?;
            writeln!(w, "  created: {}", item.created_at.to_rfc3339())?;
            writeln!(w, "  updated: {}", item.updated_at.to_rfc3339())?;
            if let Some(completed) = item.completed_at {
                writeln!(w, "  completed: {}", completed.to_rfc3339())?;
            }
            Ok(())
        }),
        Err(e) => Err(fail(output, e)),
    }
}
