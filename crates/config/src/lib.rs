// SPDX-License-Identifier: Apache-2.0

//! The typed topology descriptor schema.
//!
//! The actual configuration *loader* — reading a file from disk, resolving
//! environment interpolation, applying include directives — is out of
//! scope for this core. This crate defines only the schema a
//! loader would populate: a [`TopologyDescriptor`] naming every operator,
//! its kind, its upstream/downstream edges, and, for connectors, the
//! [`NodeDescriptor::cover`] set the recovery coordinator restores during
//! restart alignment.

mod error;
mod topology;

pub use error::ConfigError;
pub use topology::{NodeDescriptor, NodeKind, TopologyDescriptor};
