// SPDX-License-Identifier: Apache-2.0

//! Shared wire model for the dataflow runtime's durable core.
//!
//! This crate defines the [`Tuple`] variants that flow through a pending
//! window, the [`NodeId`] identifying operators and connectors, the
//! [`VersionAck`] message downstream connectors send back upstream, the
//! [`WindowError`] taxonomy, and the self-delimiting binary frame format
//! segments are written in.

pub mod ack;
pub mod error;
pub mod frame;
pub mod node;
pub mod tuple;

pub use ack::VersionAck;
pub use error::WindowError;
pub use node::NodeId;
pub use tuple::{BarrierTuple, DataTuple, Tuple};

/// A barrier version number. Strictly increasing per emitting operator.
pub type Version = u64;
