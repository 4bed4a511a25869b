//! `wl create` — create a new backlog item.

use chrono::NaiveDate;
use clap::Args;
use worklog_core::WorklogStore;
use worklog_core::model::backlog::BacklogDraft;

use crate::output::{OutputMode, fail, render, write_item};

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Title of the new item.
    #[arg(short, long)]
    pub title: String,

    /// Description text.
    #[arg(short, long, default_value = "")]
    pub description: String,

    /// Priority 1 (highest) to 5 (lowest).
    #[arg(short, long)]
    pub priority: Option<u8>,

    /// Assignee name.
    #[arg(short, long)]
    pub assignee: Option<String>,

    /// Tags to attach (repeatable).
    #[arg(long = "tag")]
    pub tags: Vec<String>,

    /// Due date (YYYY-MM-DD).
    #[arg(long)]
    pub due: Option<NaiveDate>,
}

pub fn run_create(args: &CreateArgs, store: &WorklogStore, output: OutputMode) -> anyhow::Result<()> {
    let draft = BacklogDraft {
        title: args.title.clone(),
        description: args.description.clone(),
        priority: args.priority,
        assignee: args.assignee.clone(),
        tags: args.tags.clone(),
        due_date: args.due,
        ..BacklogDraft::default()
    };

    match store.create_backlog(draft) {
        Ok(item) => render(output, &item, |item, w| write_item(w, item)),
        Err(e) => Err(fail(output, e)),
    }
}
