// SPDX-License-Identifier: Apache-2.0

//! The per-window state machine.

use flowkeep_model::WindowError;

/// Lifecycle state of a [`crate::PendingWindow`].
///
/// `append`, `extend`, and `handle_version_ack` are legal only in
/// [`WindowState::Active`]. `rewind`, `truncate`, and `replay` are legal in
/// [`WindowState::Recovering`] or [`WindowState::Replaying`], as the
/// recovery coordinator dictates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowState {
    /// Normal operation: the operator's emit path may append and the ack
    /// handler may run.
    Active,
    /// Owned by the recovery coordinator during cluster restart; no
    /// operator is running concurrently.
    Recovering,
    /// `replay` is in progress, redelivering the retained suffix to the
    /// operator via `multicast`.
    Replaying,
    /// The operator has been retired; the window no longer accepts calls.
    Closed,
}

impl WindowState {
    /// Returns an error unless `self` is `Active`.
    pub(crate) fn require_active(self) -> Result<(), WindowError> {
        if self == WindowState::Active {
            Ok(())
        } else {
            Err(WindowError::InvariantViolation(format!(
                "operation requires Active state, window is {self:?}"
            )))
        }
    }

    /// Returns an error unless `self` is `Recovering` or `Replaying`.
    pub(crate) fn require_recovering_or_replaying(self) -> Result<(), WindowError> {
        if matches!(self, WindowState::Recovering | WindowState::Replaying) {
            Ok(())
        } else {
            Err(WindowError::InvariantViolation(format!(
                "operation requires Recovering or Replaying state, window is {self:?}"
            )))
        }
    }

    /// Returns an error unless `self` is `Active` or `Recovering`.
    ///
    /// `handle_version_ack` uses this rather than [`Self::require_active`]:
    /// the recovery coordinator completes in-flight acks against an
    /// upstream connector's window while that window sits in `Recovering`,
    /// before its own alignment has necessarily run —
    /// the same ack-quorum logic applies whether a live downstream
    /// connector or the coordinator is the caller.
    pub(crate) fn require_active_or_recovering(self) -> Result<(), WindowError> {
        if matches!(self, WindowState::Active | WindowState::Recovering) {
            Ok(())
        } else {
            Err(WindowError::InvariantViolation(format!(
                "operation requires Active or Recovering state, window is {self:?}"
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn active_accepts_active_only_operations() {
        assert!(WindowState::Active.require_active().is_ok());
        assert!(WindowState::Recovering.require_active().is_err());
    }

    #[test]
    fn recovery_operations_accept_recovering_and_replaying() {
        assert!(WindowState::Recovering.require_recovering_or_replaying().is_ok());
        assert!(WindowState::Replaying.require_recovering_or_replaying().is_ok());
        assert!(WindowState::Active.require_recovering_or_replaying().is_err());
        assert!(WindowState::Closed.require_recovering_or_replaying().is_err());
    }
}
