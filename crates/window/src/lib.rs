// SPDX-License-Identifier: Apache-2.0

//! The pending window: the per-operator durable output buffer.
//!
//! A [`PendingWindow`] logs every tuple an operator emits to a durable
//! [`flowkeep_segment::SegmentStore`], advances the safe-version frontier as
//! downstream connectors acknowledge versions by quorum, truncates durable
//! state once it is no longer needed for recovery, and replays the retained
//! suffix on restart. This crate owns none of the cluster-wide restart
//! policy — see `flowkeep-recovery` for that — only the single-operator
//! mechanics spec'd as the heart of the system.

mod ack_queues;
mod operator;
mod state;
mod window;

pub use ack_queues::AckQueues;
pub use operator::Operator;
pub use state::WindowState;
pub use window::PendingWindow;
