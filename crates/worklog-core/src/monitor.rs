//! Monitoring read paths: overdue and stale detection.
//!
//! Thin, parameterized calls into the query engine. Each invocation is
//! independent and idempotent; the external scheduler decides cadence.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::error::Result;
use crate::model::backlog::{BacklogItem, Status};
use crate::query::{BacklogQuery, SortKey, SortOrder, run_query};
use crate::store::WorklogStore;

/// Statuses that still count as open work.
pub const NON_TERMINAL: [Status; 4] = [
    Status::Todo,
    Status::InProgress,
    Status::Review,
    Status::Blocked,
];

/// An overdue item with how far past due it is.
#[derive(Debug, Clone, Serialize)]
pub struct OverdueTask {
    #[serde(flatten)]
    pub item: BacklogItem,
    pub days_overdue: i64,
}

/// A stale item with how long it has gone untouched.
#[derive(Debug, Clone, Serialize)]
pub struct StaleTask {
    #[serde(flatten)]
    pub item: BacklogItem,
    pub days_stale: i64,
}

/// Query: non-terminal items due strictly before `today`, soonest first.
#[must_use]
pub fn overdue_query(today: NaiveDate) -> BacklogQuery {
    BacklogQuery {
        status: Some(NON_TERMINAL.to_vec()),
        due_before: Some(today),
        sort_by: SortKey::DueDate,
        sort_order: SortOrder::Asc,
        ..BacklogQuery::default()
    }
}

/// Query: non-terminal items untouched for more than `threshold_days`,
/// longest-idle first.
#[must_use]
pub fn stale_query(now: DateTime<Utc>, threshold_days: u32) -> BacklogQuery {
    BacklogQuery {
        status: Some(NON_TERMINAL.to_vec()),
        updated_before: Some(now - chrono::Duration::days(i64::from(threshold_days))),
        sort_by: SortKey::UpdatedAt,
        sort_order: SortOrder::Asc,
        ..BacklogQuery::default()
    }
}

/// Evaluate the overdue query against a snapshot.
pub fn overdue_in(items: &[BacklogItem], today: NaiveDate) -> Result<Vec<OverdueTask>> {
    let page = run_query(items, &overdue_query(today))?;
    Ok(page
        .items
        .into_iter()
        .map(|item| {
            let days_overdue = item
                .due_date
                .map_or(0, |due| (today - due).num_days());
            OverdueTask { item, days_overdue }
        })
        .collect())
}

/// Evaluate the stale query against a snapshot.
pub fn stale_in(
    items: &[BacklogItem],
    now: DateTime<Utc>,
    threshold_days: u32,
) -> Result<Vec<StaleTask>> {
    let page = run_query(items, &stale_query(now, threshold_days))?;
    Ok(page
        .items
        .into_iter()
        .map(|item| {
            let days_stale = (now - item.updated_at).num_days();
            StaleTask { item, days_stale }
        })
        .collect())
}

/// All currently overdue tasks in the store.
pub fn overdue_tasks(store: &WorklogStore) -> Result<Vec<OverdueTask>> {
    let items = store.list_backlog(false)?;
    overdue_in(&items, Utc::now().date_naive())
}

/// All currently stale tasks in the store, using the configured threshold
/// when `threshold_days` is `None`.
pub fn stale_tasks(store: &WorklogStore, threshold_days: Option<u32>) -> Result<Vec<StaleTask>> {
    let days = threshold_days.unwrap_or(store.config().monitor.stale_after_days);
    let items = store.list_backlog(false)?;
    stale_in(&items, Utc::now(), days)
}
