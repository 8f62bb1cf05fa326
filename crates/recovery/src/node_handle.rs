// SPDX-License-Identifier: Apache-2.0

//! The per-node handle the coordinator needs transient authority over.

use flowkeep_window::{Operator, PendingWindow};

/// Bundles one operator with the pending window it exclusively owns.
///
/// The coordinator never stores these beyond the lifetime of one
/// [`crate::RecoveryCoordinator::recover`] call — it borrows each handle
/// only long enough to drive that node's restart alignment — the
/// coordinator has exclusive access to every pending window during
/// restart, since no operator is running concurrently at that point.
pub trait NodeHandle {
    /// The operator this handle owns.
    fn operator_mut(&mut self) -> &mut dyn Operator;

    /// The pending window this handle's operator exclusively owns.
    fn pending_window_mut(&mut self) -> &mut PendingWindow;

    /// Borrows the operator and its pending window simultaneously, for
    /// callers (e.g. `replay`) that need both at once. A single
    /// `&mut self` call to `operator_mut`/`pending_window_mut` in the same
    /// expression would require two live `&mut self` borrows, which the
    /// borrow checker rejects; implementors split their own fields instead.
    fn split_mut(&mut self) -> (&mut dyn Operator, &mut PendingWindow);
}

/// A simple [`NodeHandle`] pairing a boxed operator with its window,
/// sufficient for launchers and tests that do not need a custom handle
/// type.
pub struct SimpleNodeHandle {
    operator: Box<dyn Operator>,
    pending_window: PendingWindow,
}

impl SimpleNodeHandle {
    /// Builds a handle from an operator and the window it owns.
    #[must_use]
    pub fn new(operator: Box<dyn Operator>, pending_window: PendingWindow) -> Self {
        Self {
            operator,
            pending_window,
        }
    }
}

impl NodeHandle for SimpleNodeHandle {
    fn operator_mut(&mut self) -> &mut dyn Operator {
        self.operator.as_mut()
    }

    fn pending_window_mut(&mut self) -> &mut PendingWindow {
        &mut self.pending_window
    }

    fn split_mut(&mut self) -> (&mut dyn Operator, &mut PendingWindow) {
        (self.operator.as_mut(), &mut self.pending_window)
    }
}
