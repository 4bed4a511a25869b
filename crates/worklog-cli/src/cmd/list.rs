//! `wl list` — query backlog items with filters, sorting, and pagination.

use chrono::NaiveDate;
use clap::Args;
use std::io::Write;
use worklog_core::WorklogStore;
use worklog_core::model::backlog::Status;
use worklog_core::query::{BacklogQuery, QueryPage, SortKey, SortOrder};

use crate::output::{OutputMode, fail, render, write_item_row};

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Filter by status (repeatable; values are OR-ed).
    #[arg(short, long)]
    pub status: Vec<Status>,

    /// Filter by assignee (exact match).
    #[arg(short, long)]
    pub assignee: Option<String>,

    /// Filter by tag (repeatable; any listed tag matches).
    #[arg(short, long = "tag")]
    pub tags: Vec<String>,

    /// Require every listed tag instead of any.
    #[arg(long)]
    pub all_tags: bool,

    /// Minimum priority (inclusive).
    #[arg(long)]
    pub priority_min: Option<u8>,

    /// Maximum priority (inclusive).
    #[arg(long)]
    pub priority_max: Option<u8>,

    /// Case-insensitive text search over title and description.
    #[arg(short = 'q', long)]
    pub search: Option<String>,

    /// Only items due on or after this date (YYYY-MM-DD).
    #[arg(long)]
    pub due_after: Option<NaiveDate>,

    /// Only items due strictly before this date (YYYY-MM-DD).
    #[arg(long)]
    pub due_before: Option<NaiveDate>,

    /// Sort key: created_at, updated_at, priority, title, status, due_date.
    #[arg(long, default_value = "updated_at")]
    pub sort: SortKey,

    /// Sort direction: asc or desc.
    #[arg(long, default_value = "desc")]
    pub order: SortOrder,

    /// Maximum items to return (1 to 100).
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,

    /// Number of matching items to skip.
    #[arg(long, default_value = "0")]
    pub offset: usize,

    /// Include archived items.
    #[arg(long)]
    pub archived: bool,

    /// Include per-status and per-priority counts.
    #[arg(long)]
    pub stats: bool,
}

impl ListArgs {
    fn to_query(&self) -> BacklogQuery {
        let (tags, tags_all) = if self.tags.is_empty() {
            (None, None)
        } else if self.all_tags {
            (None, Some(self.tags.clone()))
        } else {
            (Some(self.tags.clone()), None)
        };

        BacklogQuery {
            full_text: self.search.clone(),
            status: (!self.status.is_empty()).then(|| self.status.clone()),
            assignee: self.assignee.clone(),
            priority_min: self.priority_min,
            priority_max: self.priority_max,
            tags,
            tags_all,
            due_after: self.due_after,
            due_before: self.due_before,
            include_archived: self.archived,
            sort_by: self.sort,
            sort_order: self.order,
            limit: self.limit,
            offset: self.offset,
            include_stats: self.stats,
            ..BacklogQuery::default()
        }
    }
}

pub fn run_list(args: &ListArgs, store: &WorklogStore, output: OutputMode) -> anyhow::Result<()> {
    match store.search_backlog(&args.to_query()) {
        Ok(page) => render(output, &page, write_page),
        Err(e) => Err(fail(output, e)),
    }
}

fn write_page(page: &QueryPage, w: &mut dyn Write) -> std::io::Result<()> {
    for item in &page.items {
        write_item_row(w, item)?;
    }
    writeln!(w, "{} of {} items", page.items.len(), page.total)?;
    if let Some(ref stats) = page.stats {
        let mut by_status: Vec<_> = stats.by_status.iter().collect();
        by_status.sort();
        for (status, count) in by_status {
            writeln!(w, "  {status}: {count}")?;
        }
        let mut by_priority: Vec<_> = stats.by_priority.iter().collect();
        by_priority.sort();
        for (priority, count) in by_priority {
            writeln!(w, "  P{priority}: {count}")?;
        }
    }
    Ok(())
}
