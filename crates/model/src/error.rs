// SPDX-License-Identifier: Apache-2.0

//! Error taxonomy for the pending window and the durable segment layer.

use crate::node::NodeId;
use crate::Version;

/// Errors a [`crate::Tuple`]-level operation against a backup directory can fail with.
#[derive(thiserror::Error, Debug)]
pub enum WindowError {
    /// A durable-storage operation failed. Not recovered locally; the
    /// operator must escalate to cluster restart.
    #[error("durable storage failure in segment {segment}: {source}")]
    IoError {
        /// The segment name (or `"current"`) the failing I/O targeted.
        segment: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A sealed segment contains a torn record before its end.
    #[error("segment {version} is corrupt: torn record at byte offset {offset}")]
    CorruptSegment {
        /// The sealed segment's version name.
        version: Version,
        /// Byte offset within the segment where the torn record begins.
        offset: u64,
    },

    /// A durable-state invariant was violated — a bug or disk corruption.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// An ack arrived from a `sent_from` not present in the ack-queue map.
    /// Logged and dropped by callers; not fatal.
    #[error("version ack from unknown channel {channel}")]
    UnknownChannel {
        /// The unrecognized channel that sent the ack.
        channel: NodeId,
    },
}

impl WindowError {
    /// Wraps an [`std::io::Error`] observed while operating on `segment`.
    #[must_use]
    pub fn io(segment: impl Into<String>, source: std::io::Error) -> Self {
        WindowError::IoError {
            segment: segment.into(),
            source,
        }
    }
}
