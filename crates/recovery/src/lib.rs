// SPDX-License-Identifier: Apache-2.0

//! The recovery coordinator: cluster-wide restart alignment.
//!
//! Runs once per cluster restart. Collects each connector's latest durable
//! version, completes acknowledgements that were in flight when the
//! cluster crashed, rewinds and restores every connector to a common cut,
//! and persists the result back to the snapshot catalog before handing
//! control back to the (out-of-scope) launcher.

mod catalog;
mod coordinator;
mod error;
mod node_handle;

pub use catalog::{FsSnapshotCatalog, SnapshotCatalog};
pub use coordinator::RecoveryCoordinator;
pub use error::RecoveryError;
pub use node_handle::NodeHandle;
