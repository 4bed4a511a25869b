//! `wl overdue` and `wl stale` — monitoring reads over the backlog.

use clap::Args;
use std::io::Write;
use worklog_core::WorklogStore;
use worklog_core::monitor::{self, OverdueTask, StaleTask};

use crate::output::{OutputMode, fail, render, write_item_row};

#[derive(Args, Debug)]
pub struct StaleArgs {
    /// Days without an update before a task counts as stale
    /// (defaults to the repository configuration).
    #[arg(short, long)]
    pub days: Option<u32>,
}

pub fn run_overdue(store: &WorklogStore, output: OutputMode) -> anyhow::Result<()> {
    match monitor::overdue_tasks(store) {
        Ok(tasks) => render(output, &tasks, |tasks: &Vec<OverdueTask>, w| {
            for task in tasks {
                write_item_row(w, &task.item)?;
                writeln!(w, "  {} days overdue", task.days_overdue)?;
            }
            writeln!(w, "{} overdue tasks", tasks.len())
        }),
        Err(e) => Err(fail(output, e)),
    }
}

pub fn run_stale(args: &StaleArgs, store: &WorklogStore, output: OutputMode) -> anyhow::Result<()> {
    match monitor::stale_tasks(store, args.days) {
        Ok(tasks) => render(output, &tasks, |tasks: &Vec<StaleTask>, w| {
            for task in tasks {
                write_item_row(w, &task.item)?;
                writeln!(w, "  {} days without update", task.days_stale)?;
            }
            writeln!(w, "{} stale tasks", tasks.len())
        }),
        Err(e) => Err(fail(output, e)),
    }
}
