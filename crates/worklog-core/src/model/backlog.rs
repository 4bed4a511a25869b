//! Backlog items: the mutable work-tracking record.
//!
//! Each item is one markdown file keyed by its id. The markdown shape is
//! stable and greppable: a title heading, bold metadata fields, then
//! `## Description` and `## Metadata` sections.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};

/// The six lifecycle statuses.
///
/// Declaration order doubles as the sort order for `sort_by = status`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    #[default]
    Todo,
    InProgress,
    Review,
    Done,
    Blocked,
    Cancelled,
}

impl Status {
    pub(crate) const fn as_str(self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::InProgress => "in_progress",
            Self::Review => "review",
            Self::Done => "done",
            Self::Blocked => "blocked",
            Self::Cancelled => "cancelled",
        }
    }

    /// Terminal statuses admit no further transition.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Cancelled)
    }

    /// All statuses, in declaration order.
    pub const ALL: [Self; 6] = [
        Self::Todo,
        Self::InProgress,
        Self::Review,
        Self::Done,
        Self::Blocked,
        Self::Cancelled,
    ];
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "todo" => Ok(Self::Todo),
            "in_progress" => Ok(Self::InProgress),
            "review" => Ok(Self::Review),
            "done" => Ok(Self::Done),
            "blocked" => Ok(Self::Blocked),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(StoreError::validation(
                "status",
                format!(
                    "'{s}' is not one of: todo, in_progress, review, done, blocked, cancelled"
                ),
            )),
        }
    }
}

/// Priority bounds, 1 = highest.
pub const PRIORITY_MIN: u8 = 1;
pub const PRIORITY_MAX: u8 = 5;
const DEFAULT_PRIORITY: u8 = 3;

/// A stored backlog item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BacklogItem {
    pub id: String,
    pub title: String,
    pub description: String,
    pub status: Status,
    pub priority: u8,
    pub assignee: Option<String>,
    pub tags: Vec<String>,
    pub due_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub archived: bool,
}

/// Input for creating a backlog item. Unset fields take defaults.
#[derive(Debug, Clone, Default)]
pub struct BacklogDraft {
    pub title: String,
    pub description: String,
    pub status: Option<Status>,
    pub priority: Option<u8>,
    pub assignee: Option<String>,
    pub tags: Vec<String>,
    pub due_date: Option<NaiveDate>,
}

/// Partial update: only the provided fields change.
///
/// Status changes are excluded here on purpose; they go through the
/// workflow-checked `update_status` path.
#[derive(Debug, Clone, Default)]
pub struct BacklogPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<u8>,
    /// `Some(None)` clears the assignee.
    pub assignee: Option<Option<String>>,
    pub tags: Option<Vec<String>>,
    /// `Some(None)` clears the due date.
    pub due_date: Option<Option<NaiveDate>>,
}

impl BacklogPatch {
    /// True when no field is set; an empty patch is rejected by the store.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.priority.is_none()
            && self.assignee.is_none()
            && self.tags.is_none()
            && self.due_date.is_none()
    }

    pub(crate) fn apply_to(&self, item: &mut BacklogItem) {
        if let Some(title) = &self.title {
            item.title = title.clone();
        }
        if let Some(description) = &self.description {
            item.description = description.clone();
        }
        if let Some(priority) = self.priority {
            item.priority = priority;
        }
        if let Some(assignee) = &self.assignee {
            item.assignee = assignee.clone();
        }
        if let Some(tags) = &self.tags {
            item.tags = normalize_tags(tags.clone());
        }
        if let Some(due_date) = self.due_date {
            item.due_date = due_date;
        }
    }
}

/// Tags carry set semantics: order irrelevant, no duplicates.
fn normalize_tags(mut tags: Vec<String>) -> Vec<String> {
    for tag in &mut tags {
        *tag = tag.trim().to_string();
    }
    tags.retain(|t| !t.is_empty());
    tags.sort();
    tags.dedup();
    tags
}

impl BacklogItem {
    /// Build a validated item from a draft with freshly stamped timestamps.
    pub fn from_draft(draft: BacklogDraft, id: String, now: DateTime<Utc>) -> Result<Self> {
        let item = Self {
            id,
            title: draft.title.trim().to_string(),
            description: draft.description,
            status: draft.status.unwrap_or_default(),
            priority: draft.priority.unwrap_or(DEFAULT_PRIORITY),
            assignee: draft.assignee,
            tags: normalize_tags(draft.tags),
            due_date: draft.due_date,
            created_at: now,
            updated_at: now,
            completed_at: None,
            archived: false,
        };
        item.validate()?;
        Ok(item)
    }

    /// Check the record invariants, naming the offending field on failure.
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(StoreError::validation("title", "must not be empty"));
        }
        if !(PRIORITY_MIN..=PRIORITY_MAX).contains(&self.priority) {
            return Err(StoreError::validation(
                "priority",
                format!(
                    "{} is out of range [{PRIORITY_MIN},{PRIORITY_MAX}]",
                    self.priority
                ),
            ));
        }
        if self.updated_at < self.created_at {
            return Err(StoreError::validation(
                "updated_at",
                "must not precede created_at",
            ));
        }
        Ok(())
    }

    /// Non-terminal and past its due date as of `today`.
    #[must_use]
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        !self.status.is_terminal() && self.due_date.is_some_and(|due| due < today)
    }

    /// Non-terminal and untouched for longer than `threshold_days`.
    #[must_use]
    pub fn is_stale(&self, now: DateTime<Utc>, threshold_days: u32) -> bool {
        !self.status.is_terminal()
            && self.updated_at < now - chrono::Duration::days(i64::from(threshold_days))
    }

    /// The text handed to the semantic index on every mutation.
    #[must_use]
    pub fn index_text(&self) -> String {
        format!("{}\n{}", self.title, self.description)
    }

    /// Render the record file.
    #[must_use]
    pub fn to_markdown(&self) -> String {
        let mut md = format!("# {}\n\n", self.title);
        md.push_str(&format!("**ID:** {}\n", self.id));
        md.push_str(&format!("**Status:** {}\n", self.status));
        md.push_str(&format!("**Priority:** {}\n", self.priority));
        if let Some(assignee) = &self.assignee {
            md.push_str(&format!("**Assignee:** {assignee}\n"));
        }
        if let Some(due) = self.due_date {
            md.push_str(&format!("**Due Date:** {}\n", due.format("%Y-%m-%d")));
        }
        if !self.tags.is_empty() {
            md.push_str(&format!("**Tags:** {}\n", self.tags.join(", ")));
        }
        if self.archived {
            md.push_str("**Archived:** true\n");
        }
        md.push_str("\n## Description\n");
        md.push_str(&self.description);
        md.push_str("\n\n## Metadata\n");
        md.push_str(&format!("- Created: {}\n", rfc3339(self.created_at)));
        md.push_str(&format!("- Updated: {}\n", rfc3339(self.updated_at)));
        if let Some(completed) = self.completed_at {
            md.push_str(&format!("- Completed: {}\n", rfc3339(completed)));
        }
        md
    }

    /// Parse a record file. Unknown lines are ignored; missing required
    /// fields are errors.
    pub fn from_markdown(content: &str) -> Result<Self> {
        let mut title = None;
        let mut id = None;
        let mut status = Status::Todo;
        let mut priority = DEFAULT_PRIORITY;
        let mut assignee = None;
        let mut tags = Vec::new();
        let mut due_date = None;
        let mut archived = false;
        let mut created_at = None;
        let mut updated_at = None;
        let mut completed_at = None;
        let mut description = String::new();

        #[derive(PartialEq)]
        enum Section {
            None,
            Description,
            Metadata,
        }
        let mut section = Section::None;

        for line in content.lines() {
            if let Some(heading) = line.strip_prefix("# ") {
                title = Some(heading.trim().to_string());
            } else if line.starts_with("## Description") {
                section = Section::Description;
            } else if line.starts_with("## Metadata") {
                section = Section::Metadata;
            } else if line.starts_with("##") {
                section = Section::None;
            } else if section == Section::Description {
                description.push_str(line);
                description.push('\n');
            } else if section == Section::Metadata {
                if let Some(value) = line.strip_prefix("- Created:") {
                    created_at = Some(parse_timestamp("created_at", value)?);
                } else if let Some(value) = line.strip_prefix("- Updated:") {
                    updated_at = Some(parse_timestamp("updated_at", value)?);
                } else if let Some(value) = line.strip_prefix("- Completed:") {
                    completed_at = Some(parse_timestamp("completed_at", value)?);
                }
            } else if let Some(value) = super::md_field(line, "**ID:**") {
                id = Some(value.to_string());
            } else if let Some(value) = super::md_field(line, "**Status:**") {
                status = value.parse()?;
            } else if let Some(value) = super::md_field(line, "**Priority:**") {
                priority = value.parse().map_err(|_| {
                    StoreError::validation("priority", format!("'{value}' is not a number"))
                })?;
            } else if let Some(value) = super::md_field(line, "**Assignee:**") {
                assignee = Some(value.to_string());
            } else if let Some(value) = super::md_field(line, "**Due Date:**") {
                due_date = Some(parse_due_date(value)?);
            } else if let Some(value) = super::md_field(line, "**Tags:**") {
                tags = value.split(',').map(str::to_string).collect();
            } else if let Some(value) = super::md_field(line, "**Archived:**") {
                archived = value.eq_ignore_ascii_case("true");
            }
        }

        let item = Self {
            id: id.ok_or_else(|| StoreError::validation("id", "missing **ID:** field"))?,
            title: title.ok_or_else(|| StoreError::validation("title", "missing title heading"))?,
            description: description.trim().to_string(),
            status,
            priority,
            assignee,
            tags: normalize_tags(tags),
            due_date,
            created_at: created_at
                .ok_or_else(|| StoreError::validation("created_at", "missing Created entry"))?,
            updated_at: updated_at
                .ok_or_else(|| StoreError::validation("updated_at", "missing Updated entry"))?,
            completed_at,
            archived,
        };
        item.validate()?;
        Ok(item)
    }
}

pub(crate) fn rfc3339(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_timestamp(field: &'static str, value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value.trim())
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| StoreError::validation(field, format!("'{}': {e}", value.trim())))
}

fn parse_due_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|e| StoreError::validation("due_date", format!("'{}': {e}", value.trim())))
}
