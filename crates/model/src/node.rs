// SPDX-License-Identifier: Apache-2.0

//! Identity of an operator or connector in the dataflow graph.

use std::fmt;

/// Identifies a node (spout, bolt, connector, or sink) in the dataflow graph.
///
/// Carries both a dense integer index, useful for compact ack-queue keys and
/// registry lookups, and a human-readable name for logging, mirroring the
/// two-part identifier the pipeline engine uses for its own nodes.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct NodeId {
    index: u32,
    name: String,
}

impl NodeId {
    /// Builds a new node identifier from an index and a display name.
    #[must_use]
    pub fn new(index: u32, name: impl Into<String>) -> Self {
        Self {
            index,
            name: name.into(),
        }
    }

    /// The dense integer index assigned to this node.
    #[must_use]
    pub fn index(&self) -> u32 {
        self.index
    }

    /// The node's display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.name, self.index)
    }
}
