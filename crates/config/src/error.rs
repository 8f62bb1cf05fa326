// SPDX-License-Identifier: Apache-2.0

//! Errors raised while parsing or validating a [`crate::TopologyDescriptor`].

use flowkeep_model::NodeId;

/// Errors that can occur while building a [`crate::TopologyDescriptor`].
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// The input was not valid JSON for a topology descriptor.
    #[error("invalid topology JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// The input was not valid YAML for a topology descriptor.
    #[error("invalid topology YAML: {0}")]
    InvalidYaml(#[from] serde_yaml::Error),

    /// Two nodes in the descriptor share the same id.
    #[error("duplicate node id {id} in topology descriptor")]
    DuplicateNode {
        /// The id that appeared more than once.
        id: NodeId,
    },

    /// A node's edge list names a node id that is not itself defined in
    /// the descriptor.
    #[error("node {from} references undefined node {to}")]
    UnknownNodeReference {
        /// The node whose edge list contains the bad reference.
        from: NodeId,
        /// The undefined node it references.
        to: NodeId,
    },
}
