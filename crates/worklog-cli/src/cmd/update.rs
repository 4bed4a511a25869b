//! `wl update` — change fields on an existing backlog item.

use chrono::NaiveDate;
use clap::Args;
use worklog_core::WorklogStore;
use worklog_core::model::backlog::BacklogPatch;

use crate::output::{OutputMode, fail, render, write_item};

#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Backlog item ID.
    pub id: String,

    /// New title.
    #[arg(long)]
    pub title: Option<String>,

    /// New description.
    #[arg(long)]
    pub description: Option<String>,

    /// New priority 1 (highest) to 5 (lowest).
    #[arg(long)]
    pub priority: Option<u8>,

    /// New assignee.
    #[arg(long, conflicts_with = "clear_assignee")]
    pub assignee: Option<String>,

    /// Remove the assignee.
    #[arg(long)]
    pub clear_assignee: bool,

    /// Replace the tag set (repeatable).
    #[arg(long = "tag", conflicts_with = "clear_tags")]
    pub tags: Vec<String>,

    /// Remove all tags.
    #[arg(long)]
    pub clear_tags: bool,

    /// New due date (YYYY-MM-DD).
    #[arg(long, conflicts_with = "clear_due")]
    pub due: Option<NaiveDate>,

    /// Remove the due date.
    #[arg(long)]
    pub clear_due: bool,
}

impl UpdateArgs {
    fn to_patch(&self) -> BacklogPatch {
        let assignee = if self.clear_assignee {
            Some(None)
        } else {
            self.assignee.clone().map(Some)
        };
        let tags = if self.clear_tags {
            Some(Vec::new())
        } else if self.tags.is_empty() {
            None
        } else {
            Some(self.tags.clone())
        };
        let due_date = if self.clear_due {
            Some(None)
        } else {
            self.due.map(Some)
        };

        BacklogPatch {
            title: self.title.clone(),
            description: self.description.clone(),
            priority: self.priority,
            assignee,
            tags,
            due_date,
        }
    }
}

pub fn run_update(args: &UpdateArgs, store: &WorklogStore, output: OutputMode) -> anyhow::Result<()> {
    match store.update_backlog(&args.id, &args.to_patch()) {
        Ok(item) => render(output, &item, |item, w| write_item(w, item)),
        Err(e) => Err(fail(output, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Wrapper {
        #[command(flatten)]
        args: UpdateArgs,
    }

    #[test]
    fn no_flags_build_an_empty_patch() {
        let w = Wrapper::parse_from(["test", "a1b2c3d4"]);
        assert!(w.args.to_patch().is_empty());
    }

    #[test]
    fn clear_flags_map_to_explicit_none() {
        let w = Wrapper::parse_from(["test", "a1b2c3d4", "--clear-assignee", "--clear-due"]);
        let patch = w.args.to_patch();
        assert_eq!(patch.assignee, Some(None));
        assert_eq!(patch.due_date, Some(None));
        assert!(patch.tags.is_none());
    }

    #[test]
    fn set_and_clear_conflict() {
        let result = Wrapper::try_parse_from([
            "test",
            "a1b2c3d4",
            "--assignee",
            "alice",
            "--clear-assignee",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn tag_flags_replace_the_set() {
        let w = Wrapper::parse_from(["test", "a1b2c3d4", "--tag", "x", "--tag", "y"]);
        let patch = w.args.to_patch();
        assert_eq!(patch.tags.as_deref(), Some(&["x".to_string(), "y".to_string()][..]));
    }
}
