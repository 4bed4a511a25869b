//! Status lifecycle rules.
//!
//! The policy is a from-state x to-state table so it can be tightened later
//! without touching call sites. Current policy: `done` and `cancelled` are
//! terminal; every other transition between the six statuses is allowed,
//! including self-transitions on non-terminal statuses (a refresh).

use crate::error::{Result, StoreError};
use crate::model::backlog::Status;

/// Whether the workflow permits moving from `from` to `to`.
#[must_use]
pub const fn transition_allowed(from: Status, to: Status) -> bool {
    // `to` is unconstrained today; keep it in the signature so the table
    // can grow per-target rules without an API change.
    let _ = to;
    !from.is_terminal()
}

/// Validate a transition, reporting both statuses on denial.
pub fn check_transition(from: Status, to: Status) -> Result<()> {
    if transition_allowed(from, to) {
        Ok(())
    } else {
        Err(StoreError::InvalidTransition { from, to })
    }
}

#[cfg(test)]
mod tests {
    use super::{check_transition, transition_allowed};
    use crate::error::StoreError;
    use crate::model::backlog::Status;

    #[test]
    fn non_terminal_transitions_go_anywhere() {
        let non_terminal = [
            Status::Todo,
            Status::InProgress,
            Status::Review,
            Status::Blocked,
        ];
        for from in non_terminal {
            for to in Status::ALL {
                assert!(
                    transition_allowed(from, to),
                    "{from} -> {to} should be allowed"
                );
            }
        }
    }

    #[test]
    fn terminal_statuses_admit_no_exit() {
        for from in [Status::Done, Status::Cancelled] {
            for to in Status::ALL {
                let err = check_transition(from, to).unwrap_err();
                assert!(matches!(
                    err,
                    StoreError::InvalidTransition { from: f, to: t } if f == from && t == to
                ));
            }
        }
    }
}
