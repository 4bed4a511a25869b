//! Index notification seam.
//!
//! After every successful mutating commit the store tells the external
//! semantic index what changed. CRUD and structured queries never depend on
//! the index; a failed or absent notifier costs only search freshness.

use crate::model::RecordKind;

/// What happened to a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexAction {
    Created,
    Updated,
    Archived,
    Deleted,
}

/// One mutation, as seen by the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEvent {
    pub kind: RecordKind,
    pub id: String,
    pub action: IndexAction,
    /// Current text content; `None` for permanent deletes.
    pub text: Option<String>,
}

/// External index collaborator. Implementations must not block the store;
/// hand off to a queue if the real index is slow.
pub trait IndexNotifier: Send + Sync {
    fn record_changed(&self, event: IndexEvent);
}

/// Default notifier: drop everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

impl IndexNotifier for NoopNotifier {
    fn record_changed(&self, _event: IndexEvent) {}
}
