//! Query engine over backlog items.
//!
//! One explicit criteria struct with every recognized clause enumerated;
//! all set clauses combine with AND. Evaluation is a pure function of the
//! snapshot and the parameters: a single filter pass, a sort, then the
//! pagination slice. Stats, when requested, are computed over the filtered
//! pre-pagination set.
//!
//! Date boundary convention, fixed and documented: *-after is inclusive
//! (`>=`), *-before is exclusive (`<`).

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};
use crate::model::backlog::{BacklogItem, Status};

/// Pagination cap.
pub const MAX_LIMIT: usize = 100;

/// Sort key for backlog listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    CreatedAt,
    #[default]
    UpdatedAt,
    Priority,
    Title,
    Status,
    /// Items without a due date sort last in either direction.
    DueDate,
}

impl SortKey {
    const fn as_str(self) -> &'static str {
        match self {
            Self::CreatedAt => "created_at",
            Self::UpdatedAt => "updated_at",
            Self::Priority => "priority",
            Self::Title => "title",
            Self::Status => "status",
            Self::DueDate => "due_date",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "created_at" | "created" => Ok(Self::CreatedAt),
            "updated_at" | "updated" => Ok(Self::UpdatedAt),
            "priority" => Ok(Self::Priority),
            "title" => Ok(Self::Title),
            "status" => Ok(Self::Status),
            "due_date" | "due" => Ok(Self::DueDate),
            other => Err(StoreError::validation(
                "sort_by",
                format!(
                    "'{other}' is not one of: created_at, updated_at, priority, title, status, due_date"
                ),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        })
    }
}

impl FromStr for SortOrder {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(Self::Asc),
            "desc" | "descending" => Ok(Self::Desc),
            other => Err(StoreError::validation(
                "sort_order",
                format!("'{other}' is not one of: asc, desc"),
            )),
        }
    }
}

/// Filter, sort, and pagination criteria for backlog queries.
///
/// All clauses are optional and combine with AND semantics. Text matching is
/// case-insensitive substring containment. Date clauses follow the
/// inclusive-after/exclusive-before convention noted per field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BacklogQuery {
    /// Substring of title OR description, case-insensitive.
    pub full_text: Option<String>,
    /// Substring of the title, case-insensitive.
    pub title_contains: Option<String>,
    /// Substring of the description, case-insensitive.
    pub description_contains: Option<String>,

    /// Set membership: item matches if its status is in this set.
    pub status: Option<Vec<Status>>,
    /// Exact assignee match.
    pub assignee: Option<String>,
    /// Inclusive lower priority bound.
    pub priority_min: Option<u8>,
    /// Inclusive upper priority bound.
    pub priority_max: Option<u8>,
    /// Item matches if it carries at least one of these tags.
    pub tags: Option<Vec<String>>,
    /// Item matches only if it carries every one of these tags.
    pub tags_all: Option<Vec<String>>,

    /// `created_at >= this` (inclusive).
    pub created_after: Option<DateTime<Utc>>,
    /// `created_at < this` (exclusive).
    pub created_before: Option<DateTime<Utc>>,
    /// `updated_at >= this` (inclusive).
    pub updated_after: Option<DateTime<Utc>>,
    /// `updated_at < this` (exclusive).
    pub updated_before: Option<DateTime<Utc>>,
    /// `due_date >= this` (inclusive); items without a due date never match.
    pub due_after: Option<NaiveDate>,
    /// `due_date < this` (exclusive); items without a due date never match.
    pub due_before: Option<NaiveDate>,
    /// Presence check on `due_date`.
    pub has_due_date: Option<bool>,

    /// Include archived items (default false).
    pub include_archived: bool,

    pub sort_by: SortKey,
    pub sort_order: SortOrder,

    /// Page size, 1..=100 when present.
    pub limit: Option<usize>,
    /// Page start offset.
    pub offset: usize,

    /// Also compute per-status and per-priority counts over the filtered set.
    pub include_stats: bool,
}

/// Aggregate counters over the filtered (pre-pagination) result set.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QueryStats {
    pub by_status: HashMap<String, usize>,
    pub by_priority: HashMap<u8, usize>,
}

/// One page of results plus the pre-pagination total.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryPage {
    pub items: Vec<BacklogItem>,
    pub total: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<QueryStats>,
}

impl BacklogQuery {
    /// Reject out-of-range pagination and priority bounds up front.
    pub fn validate(&self) -> Result<()> {
        if let Some(limit) = self.limit {
            if !(1..=MAX_LIMIT).contains(&limit) {
                return Err(StoreError::validation(
                    "limit",
                    format!("{limit} is out of range [1,{MAX_LIMIT}]"),
                ));
            }
        }
        for (field, bound) in [("priority_min", self.priority_min), ("priority_max", self.priority_max)]
        {
            if let Some(p) = bound {
                if !(1..=5).contains(&p) {
                    return Err(StoreError::validation(
                        field,
                        format!("{p} is out of range [1,5]"),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Whether one item satisfies every set clause.
    #[must_use]
    pub fn matches(&self, item: &BacklogItem) -> bool {
        if item.archived && !self.include_archived {
            return false;
        }

        if let Some(needle) = &self.full_text {
            if !contains_ci(&item.title, needle) && !contains_ci(&item.description, needle) {
                return false;
            }
        }
        if let Some(needle) = &self.title_contains {
            if !contains_ci(&item.title, needle) {
                return false;
            }
        }
        if let Some(needle) = &self.description_contains {
            if !contains_ci(&item.description, needle) {
                return false;
            }
        }

        if let Some(statuses) = &self.status {
            if !statuses.contains(&item.status) {
                return false;
            }
        }
        if let Some(assignee) = &self.assignee {
            if item.assignee.as_deref() != Some(assignee.as_str()) {
                return false;
            }
        }
        if let Some(min) = self.priority_min {
            if item.priority < min {
                return false;
            }
        }
        if let Some(max) = self.priority_max {
            if item.priority > max {
                return false;
            }
        }
        if let Some(tags) = &self.tags {
            if !tags.iter().any(|t| item.tags.contains(t)) {
                return false;
            }
        }
        if let Some(tags) = &self.tags_all {
            if !tags.iter().all(|t| item.tags.contains(t)) {
                return false;
            }
        }

        if let Some(after) = self.created_after {
            if item.created_at < after {
                return false;
            }
        }
        if let Some(before) = self.created_before {
            if item.created_at >= before {
                return false;
            }
        }
        if let Some(after) = self.updated_after {
            if item.updated_at < after {
                return false;
            }
        }
        if let Some(before) = self.updated_before {
            if item.updated_at >= before {
                return false;
            }
        }
        if let Some(after) = self.due_after {
            match item.due_date {
                Some(due) if due >= after => {}
                _ => return false,
            }
        }
        if let Some(before) = self.due_before {
            match item.due_date {
                Some(due) if due < before => {}
                _ => return false,
            }
        }
        if let Some(required) = self.has_due_date {
            if item.due_date.is_some() != required {
                return false;
            }
        }

        true
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Evaluate a query against a snapshot of items.
///
/// Pure and idempotent: no side effects, safe to retry, and stable across
/// repeated calls on the same snapshot (ties break on `id` ascending).
pub fn run_query(items: &[BacklogItem], query: &BacklogQuery) -> Result<QueryPage> {
    query.validate()?;

    let mut matched: Vec<&BacklogItem> = items.iter().filter(|i| query.matches(i)).collect();

    matched.sort_by(|a, b| {
        let ord = match query.sort_by {
            SortKey::CreatedAt => a.created_at.cmp(&b.created_at),
            SortKey::UpdatedAt => a.updated_at.cmp(&b.updated_at),
            SortKey::Priority => a.priority.cmp(&b.priority),
            SortKey::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
            SortKey::Status => a.status.cmp(&b.status),
            // None sorts last regardless of direction.
            SortKey::DueDate => match (a.due_date, b.due_date) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => return std::cmp::Ordering::Less,
                (None, Some(_)) => return std::cmp::Ordering::Greater,
                (None, None) => std::cmp::Ordering::Equal,
            },
        };
        let ord = match query.sort_order {
            SortOrder::Asc => ord,
            SortOrder::Desc => ord.reverse(),
        };
        ord.then_with(|| a.id.cmp(&b.id))
    });

    let total = matched.len();
    let stats = query.include_stats.then(|| compute_stats(&matched));

    let start = query.offset.min(total);
    let end = query
        .limit
        .map_or(total, |limit| start.saturating_add(limit).min(total));

    Ok(QueryPage {
        items: matched[start..end].iter().map(|i| (*i).clone()).collect(),
        total,
        stats,
    })
}

fn compute_stats(matched: &[&BacklogItem]) -> QueryStats {
    let mut stats = QueryStats::default();
    for item in matched {
        *stats
            .by_status
            .entry(item.status.to_string())
            .or_insert(0) += 1;
        *stats.by_priority.entry(item.priority).or_insert(0) += 1;
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::backlog::{BacklogDraft, BacklogItem};
    use chrono::TimeZone;

    fn item(id: &str, title: &str, priority: u8, status: Status) -> BacklogItem {
        let now = Utc.with_ymd_and_hms(2025, 5, 1, 8, 0, 0).unwrap();
        let mut item = BacklogItem::from_draft(
            BacklogDraft {
                title: title.to_string(),
                priority: Some(priority),
                status: Some(status),
                ..BacklogDraft::default()
            },
            id.to_string(),
            now,
        )
        .expect("valid item");
        item.updated_at = now;
        item
    }

    fn fixture() -> Vec<BacklogItem> {
        let mut a = item("aaa", "Fix auth bug", 1, Status::Todo);
        a.description = "login token expires".to_string();
        a.tags = vec!["auth".to_string(), "bug".to_string()];
        a.assignee = Some("alice".to_string());
        a.due_date = chrono::NaiveDate::from_ymd_opt(2025, 5, 3);

        let mut b = item("bbb", "Write release notes", 3, Status::InProgress);
        b.tags = vec!["docs".to_string()];
        b.updated_at = b.created_at + chrono::Duration::hours(2);

        let mut c = item("ccc", "Archive old builds", 5, Status::Done);
        c.tags = vec!["infra".to_string(), "bug".to_string()];
        c.updated_at = c.created_at + chrono::Duration::hours(4);

        vec![a, b, c]
    }

    #[test]
    fn sort_key_parse_roundtrips() {
        for key in [
            SortKey::CreatedAt,
            SortKey::UpdatedAt,
            SortKey::Priority,
            SortKey::Title,
            SortKey::Status,
            SortKey::DueDate,
        ] {
            assert_eq!(key.to_string().parse::<SortKey>().unwrap(), key);
        }
        assert!("rank".parse::<SortKey>().is_err());
        assert_eq!("desc".parse::<SortOrder>().unwrap(), SortOrder::Desc);
    }

    #[test]
    fn default_sort_is_updated_desc() {
        let page = run_query(&fixture(), &BacklogQuery::default()).unwrap();
        let ids: Vec<_> = page.items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, ["ccc", "bbb", "aaa"]);
        assert_eq!(page.total, 3);
    }

    #[test]
    fn full_text_matches_title_or_description() {
        let query = BacklogQuery {
            full_text: Some("TOKEN".to_string()),
            ..BacklogQuery::default()
        };
        let page = run_query(&fixture(), &query).unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].id, "aaa");

        let query = BacklogQuery {
            full_text: Some("notes".to_string()),
            ..BacklogQuery::default()
        };
        assert_eq!(run_query(&fixture(), &query).unwrap().total, 1);
    }

    #[test]
    fn status_set_and_priority_sort() {
        // The canonical triage listing: open work, most urgent first.
        let items = vec![
            item("aaa", "one", 1, Status::Todo),
            item("bbb", "two", 3, Status::InProgress),
            item("ccc", "three", 5, Status::Done),
        ];
        let query = BacklogQuery {
            status: Some(vec![Status::Todo, Status::InProgress]),
            sort_by: SortKey::Priority,
            sort_order: SortOrder::Asc,
            ..BacklogQuery::default()
        };
        let page = run_query(&items, &query).unwrap();
        let got: Vec<_> = page.items.iter().map(|i| i.priority).collect();
        assert_eq!(got, [1, 3]);
    }

    #[test]
    fn priority_range_is_inclusive() {
        let items = vec![
            item("a", "p1", 1, Status::Todo),
            item("b", "p2", 2, Status::Todo),
            item("c", "p3", 3, Status::Todo),
            item("d", "p4", 4, Status::Todo),
            item("e", "p5", 5, Status::Todo),
        ];
        let query = BacklogQuery {
            priority_min: Some(2),
            priority_max: Some(4),
            ..BacklogQuery::default()
        };
        let page = run_query(&items, &query).unwrap();
        let got: Vec<_> = page.items.iter().map(|i| i.priority).collect();
        assert_eq!(page.total, 3);
        assert!(got.iter().all(|p| (2..=4).contains(p)));
    }

    #[test]
    fn tags_any_vs_tags_all() {
        let any = BacklogQuery {
            tags: Some(vec!["auth".to_string(), "infra".to_string()]),
            ..BacklogQuery::default()
        };
        assert_eq!(run_query(&fixture(), &any).unwrap().total, 2);

        let all = BacklogQuery {
            tags_all: Some(vec!["auth".to_string(), "bug".to_string()]),
            ..BacklogQuery::default()
        };
        let page = run_query(&fixture(), &all).unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].id, "aaa");
    }

    #[test]
    fn date_bounds_are_inclusive_after_exclusive_before() {
        let items = fixture();
        let t0 = items[0].created_at;

        let at_boundary = BacklogQuery {
            created_after: Some(t0),
            ..BacklogQuery::default()
        };
        assert_eq!(run_query(&items, &at_boundary).unwrap().total, 3);

        let before_boundary = BacklogQuery {
            updated_before: Some(items[1].updated_at),
            ..BacklogQuery::default()
        };
        // Exclusive: bbb itself is not matched.
        assert_eq!(run_query(&items, &before_boundary).unwrap().total, 1);
    }

    #[test]
    fn due_filters_skip_items_without_due_date() {
        let query = BacklogQuery {
            due_before: Some(chrono::NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()),
            ..BacklogQuery::default()
        };
        let page = run_query(&fixture(), &query).unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].id, "aaa");

        let query = BacklogQuery {
            has_due_date: Some(false),
            ..BacklogQuery::default()
        };
        assert_eq!(run_query(&fixture(), &query).unwrap().total, 2);
    }

    #[test]
    fn archived_items_are_hidden_by_default() {
        let mut items = fixture();
        items[1].archived = true;

        assert_eq!(run_query(&items, &BacklogQuery::default()).unwrap().total, 2);

        let with_archived = BacklogQuery {
            include_archived: true,
            ..BacklogQuery::default()
        };
        assert_eq!(run_query(&items, &with_archived).unwrap().total, 3);
    }

    #[test]
    fn pagination_is_stable_and_overflows_to_empty() {
        let items = fixture();
        let query = BacklogQuery {
            sort_by: SortKey::Priority,
            sort_order: SortOrder::Asc,
            limit: Some(2),
            ..BacklogQuery::default()
        };

        let first = run_query(&items, &query).unwrap();
        let again = run_query(&items, &query).unwrap();
        let ids = |p: &QueryPage| p.items.iter().map(|i| i.id.clone()).collect::<Vec<_>>();
        assert_eq!(ids(&first), ids(&again));
        assert_eq!(first.total, 3);
        assert_eq!(first.items.len(), 2);

        let beyond = BacklogQuery {
            offset: 10,
            ..query
        };
        let page = run_query(&items, &beyond).unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.total, 3);
    }

    #[test]
    fn limit_out_of_range_is_a_validation_error() {
        for limit in [0, MAX_LIMIT + 1] {
            let query = BacklogQuery {
                limit: Some(limit),
                ..BacklogQuery::default()
            };
            let err = run_query(&fixture(), &query).unwrap_err();
            assert!(matches!(err, StoreError::Validation { field: "limit", .. }));
        }
    }

    #[test]
    fn equal_sort_keys_tie_break_on_id_ascending() {
        let items = vec![
            item("bbb", "same", 2, Status::Todo),
            item("aaa", "same", 2, Status::Todo),
            item("ccc", "same", 2, Status::Todo),
        ];
        let query = BacklogQuery {
            sort_by: SortKey::Priority,
            sort_order: SortOrder::Desc,
            ..BacklogQuery::default()
        };
        let page = run_query(&items, &query).unwrap();
        let ids: Vec<_> = page.items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, ["aaa", "bbb", "ccc"]);
    }

    #[test]
    fn due_date_sort_puts_missing_last() {
        let mut a = item("aaa", "later", 3, Status::Todo);
        a.due_date = chrono::NaiveDate::from_ymd_opt(2025, 7, 1);
        let mut b = item("bbb", "sooner", 3, Status::Todo);
        b.due_date = chrono::NaiveDate::from_ymd_opt(2025, 6, 1);
        let c = item("ccc", "undated", 3, Status::Todo);

        let query = BacklogQuery {
            sort_by: SortKey::DueDate,
            sort_order: SortOrder::Asc,
            ..BacklogQuery::default()
        };
        let page = run_query(&[a, b, c], &query).unwrap();
        let ids: Vec<_> = page.items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, ["bbb", "aaa", "ccc"]);
    }

    #[test]
    fn stats_cover_the_filtered_set_not_the_page() {
        let query = BacklogQuery {
            include_stats: true,
            limit: Some(1),
            ..BacklogQuery::default()
        };
        let page = run_query(&fixture(), &query).unwrap();
        assert_eq!(page.items.len(), 1);
        let stats = page.stats.expect("stats requested");
        assert_eq!(stats.by_status.values().sum::<usize>(), 3);
        assert_eq!(stats.by_status.get("todo"), Some(&1));
        assert_eq!(stats.by_priority.get(&1), Some(&1));
        assert_eq!(stats.by_priority.get(&5), Some(&1));
    }
}
