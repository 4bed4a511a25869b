use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::model::RecordKind;
use crate::model::backlog::Status;

/// Machine-readable error codes for agent-friendly decision making.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    InvalidInput,
    RecordNotFound,
    InvalidStatusTransition,
    StateMismatch,
    RepoAccessFailed,
    LockContention,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::InvalidInput => "E2001",
            Self::RecordNotFound => "E2002",
            Self::InvalidStatusTransition => "E2003",
            Self::StateMismatch => "E3001",
            Self::RepoAccessFailed => "E5001",
            Self::LockContention => "E5002",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::InvalidInput => "Invalid field value",
            Self::RecordNotFound => "Record not found",
            Self::InvalidStatusTransition => "Invalid status transition",
            Self::StateMismatch => "On-disk state mismatch",
            Self::RepoAccessFailed => "Repository access failed",
            Self::LockContention => "Lock contention",
        }
    }

    /// Optional remediation hint that can be surfaced to operators and agents.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::InvalidInput => Some("Fix the named field and retry."),
            Self::RecordNotFound => None,
            Self::InvalidStatusTransition => {
                Some("done and cancelled are terminal; no transition leaves them.")
            }
            Self::StateMismatch => {
                Some("The record file disagrees with its expected state; inspect it before retrying.")
            }
            Self::RepoAccessFailed => Some("Check disk space, permissions, and that git is installed."),
            Self::LockContention => Some("Retry after the other worklog process releases its lock."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Error taxonomy for the store and query engine.
///
/// Every failure carries enough context (record kind, id, field) for the
/// caller to present a precise message. None of these are silently swallowed
/// by the core.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Malformed or out-of-range input. Not retriable.
    #[error("invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    /// Unknown record id. Not retriable.
    #[error("{kind} '{id}' not found")]
    NotFound { kind: RecordKind, id: String },

    /// Disallowed status change, with current and requested status.
    #[error("invalid status transition: {from} -> {to}")]
    InvalidTransition { from: Status, to: Status },

    /// Mismatch between expected and actual on-disk state before a mutation.
    /// Fatal for that operation; nothing was committed.
    #[error("state mismatch at {}: {detail}", path.display())]
    Consistency { path: PathBuf, detail: String },

    /// Underlying repository access failure (filesystem or git). Typically
    /// transient; callers may retry with backoff.
    #[error("{op} failed: {detail}")]
    Unavailable { op: &'static str, detail: String },

    /// Another process holds the repository mutation lock.
    #[error("lock busy at {}: waited {waited:?}", path.display())]
    LockBusy { path: PathBuf, waited: Duration },
}

impl StoreError {
    pub(crate) fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field,
            reason: reason.into(),
        }
    }

    pub(crate) fn not_found(kind: RecordKind, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    pub(crate) fn unavailable(op: &'static str, detail: impl fmt::Display) -> Self {
        Self::Unavailable {
            op,
            detail: detail.to_string(),
        }
    }

    /// Machine-readable code associated with this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Validation { .. } => ErrorCode::InvalidInput,
            Self::NotFound { .. } => ErrorCode::RecordNotFound,
            Self::InvalidTransition { .. } => ErrorCode::InvalidStatusTransition,
            Self::Consistency { .. } => ErrorCode::StateMismatch,
            Self::Unavailable { .. } => ErrorCode::RepoAccessFailed,
            Self::LockBusy { .. } => ErrorCode::LockContention,
        }
    }

    /// Optional remediation hint for operators and agents.
    #[must_use]
    pub const fn hint(&self) -> Option<&'static str> {
        self.code().hint()
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::{ErrorCode, StoreError};
    use crate::model::RecordKind;
    use crate::model::backlog::Status;
    use std::collections::HashSet;

    #[test]
    fn all_codes_are_unique() {
        let all = [
            ErrorCode::InvalidInput,
            ErrorCode::RecordNotFound,
            ErrorCode::InvalidStatusTransition,
            ErrorCode::StateMismatch,
            ErrorCode::RepoAccessFailed,
            ErrorCode::LockContention,
        ];

        let mut seen = HashSet::new();
        for code in all {
            assert!(seen.insert(code.code()), "duplicate code {}", code.code());
        }
    }

    #[test]
    fn code_format_is_machine_friendly() {
        let code = ErrorCode::InvalidStatusTransition.code();
        assert_eq!(code.len(), 5);
        assert!(code.starts_with('E'));
        assert!(code.chars().skip(1).all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn error_display_names_the_context() {
        let err = StoreError::validation("priority", "must be between 1 and 5");
        assert_eq!(err.to_string(), "invalid priority: must be between 1 and 5");
        assert_eq!(err.code(), ErrorCode::InvalidInput);

        let err = StoreError::not_found(RecordKind::Backlog, "a1b2c3d4");
        assert_eq!(err.to_string(), "backlog 'a1b2c3d4' not found");

        let err = StoreError::InvalidTransition {
            from: Status::Done,
            to: Status::Todo,
        };
        assert_eq!(err.to_string(), "invalid status transition: done -> todo");
        assert!(err.hint().is_some());
    }
}
