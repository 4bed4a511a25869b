//! worklog-core: a git-backed store for meeting notes and backlog items.
//!
//! Every record is one markdown file in a version-controlled working tree;
//! every mutation is exactly one commit. On top sits a query engine over
//! backlog items (text, field, and date filters; sorting; pagination;
//! aggregate stats) and the overdue/stale monitoring reads built on it.
//!
//! # Conventions
//!
//! - **Errors**: typed [`error::StoreError`] taxonomy inside the core;
//!   `anyhow::Result` at the edges (config loading, binaries).
//! - **Logging**: `tracing` macros (`info!`, `warn!`, `error!`, `debug!`).

pub mod config;
pub mod error;
pub mod git;
pub mod lock;
pub mod model;
pub mod monitor;
pub mod notify;
pub mod query;
pub mod store;
pub mod workflow;

pub use error::{ErrorCode, StoreError};
pub use store::WorklogStore;
