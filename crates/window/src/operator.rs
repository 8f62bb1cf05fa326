// SPDX-License-Identifier: Apache-2.0

//! The narrow operator-facing interface the pending window calls into.
//!
//! The tuple routing fabric and the operator execution loop live outside
//! this core; `Operator` is the seam between them and the
//! window. A window never stores an owning reference to its operator — the
//! operator owns its window, not the reverse — callers pass a reference in
//! only at the call sites that need it, namely [`crate::PendingWindow::replay`].

use flowkeep_model::{NodeId, Version, WindowError};

/// Operations the pending window and the recovery coordinator need from the
/// operator that owns a given window.
pub trait Operator {
    /// Delivers `tuples` to every node in `downstream`, in order. Called by
    /// [`crate::PendingWindow::replay`] once per sealed segment.
    ///
    /// # Errors
    ///
    /// Returns [`WindowError`] if delivery to any downstream node fails.
    fn multicast(&mut self, downstream: &[NodeId], tuples: &[flowkeep_model::Tuple]) -> Result<(), WindowError>;

    /// Restores this operator's in-memory state to what it was as of
    /// `version`. Called by the recovery coordinator, never by the window
    /// itself.
    ///
    /// # Errors
    ///
    /// Returns [`WindowError`] if the snapshot for `version` cannot be
    /// loaded.
    fn restore(&mut self, version: Version) -> Result<(), WindowError>;

    /// The highest version this operator has durably completed as of now.
    fn latest_version(&self) -> Version;
}
