// SPDX-License-Identifier: Apache-2.0

//! Errors raised while driving cluster-restart recovery.

use flowkeep_model::{NodeId, WindowError};

/// Errors the recovery coordinator can fail with. Any per-operator failure
/// during restart is treated as fatal to the whole cluster restart
/// there is no partial-success path out of [`crate::RecoveryCoordinator::recover`].
#[derive(thiserror::Error, Debug)]
pub enum RecoveryError {
    /// The topology names a node for which no handle was supplied to
    /// [`crate::RecoveryCoordinator::recover`].
    #[error("no node handle registered for {id}")]
    MissingNodeHandle {
        /// The node the topology describes but the caller did not provide.
        id: NodeId,
    },

    /// A pending-window or operator operation failed during recovery.
    #[error("pending window operation failed during recovery: {0}")]
    Window(#[from] WindowError),

    /// The snapshot catalog could not be read or written.
    #[error("snapshot catalog failure: {0}")]
    Catalog(#[source] std::io::Error),
}
