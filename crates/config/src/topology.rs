// SPDX-License-Identifier: Apache-2.0

//! The typed topology descriptor: operators, their kind, and their edges.

use crate::error::ConfigError;
use flowkeep_model::NodeId;
use std::collections::HashSet;

/// The role an operator plays in the dataflow graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// A source operator with no upstream nodes.
    Spout,
    /// An intermediate operator.
    Bolt,
    /// A terminal operator with no downstream nodes.
    Sink,
}

/// One operator in the topology: its identity, kind, and edges to other
/// operators.
///
/// `is_connector` is orthogonal to `kind` — a bolt or a sink may additionally
/// be an inter-segment boundary responsible for the consistency of its
/// downstream segment during recovery. A
/// spout is never a connector: it has no upstream pending window to align.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct NodeDescriptor {
    /// This operator's identity.
    pub id: NodeId,
    /// This operator's role.
    pub kind: NodeKind,
    /// Whether this operator is a connector.
    #[serde(default)]
    pub is_connector: bool,
    /// Operators whose output this node consumes directly.
    #[serde(default)]
    pub upstream_nodes: Vec<NodeId>,
    /// Operators this node emits output to directly.
    #[serde(default)]
    pub downstream_nodes: Vec<NodeId>,
    /// Upstream connectors this node (itself a connector) receives acks
    /// from, or sends acks to if it is among their downstream connectors.
    #[serde(default)]
    pub upstream_connectors: Vec<NodeId>,
    /// Downstream connectors that ack versions back to this node.
    #[serde(default)]
    pub downstream_connectors: Vec<NodeId>,
    /// The set of operators this connector is authoritative for during
    /// restart. Meaningful only when
    /// `is_connector` is set and `kind != NodeKind::Sink`.
    #[serde(default)]
    pub cover: Vec<NodeId>,
}

impl NodeDescriptor {
    /// `true` if this node is a connector that is not a sink — the set the
    /// recovery coordinator drives restart alignment through.
    #[must_use]
    pub fn is_non_sink_connector(&self) -> bool {
        self.is_connector && self.kind != NodeKind::Sink
    }
}

/// The full topology: every operator and its edges.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct TopologyDescriptor {
    nodes: Vec<NodeDescriptor>,
}

impl TopologyDescriptor {
    /// Parses a topology descriptor from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidJson`] on malformed input, or a
    /// validation error if node ids are duplicated or an edge references an
    /// undefined node.
    pub fn from_json(input: &str) -> Result<Self, ConfigError> {
        let nodes: Vec<NodeDescriptor> = serde_json::from_str(input)?;
        Self::from_nodes(nodes)
    }

    /// Parses a topology descriptor from YAML.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidYaml`] on malformed input, or a
    /// validation error if node ids are duplicated or an edge references an
    /// undefined node.
    pub fn from_yaml(input: &str) -> Result<Self, ConfigError> {
        let nodes: Vec<NodeDescriptor> = serde_yaml::from_str(input)?;
        Self::from_nodes(nodes)
    }

    /// Builds a descriptor from an already-parsed node list, validating it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::DuplicateNode`] or
    /// [`ConfigError::UnknownNodeReference`] if the node list is not
    /// internally consistent.
    pub fn from_nodes(nodes: Vec<NodeDescriptor>) -> Result<Self, ConfigError> {
        let descriptor = Self { nodes };
        descriptor.validate()?;
        Ok(descriptor)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for node in &self.nodes {
            if !seen.insert(&node.id) {
                return Err(ConfigError::DuplicateNode {
                    id: node.id.clone(),
                });
            }
        }
        for node in &self.nodes {
            let edges = node
                .upstream_nodes
                .iter()
                .chain(&node.downstream_nodes)
                .chain(&node.upstream_connectors)
                .chain(&node.downstream_connectors)
                .chain(&node.cover);
            for target in edges {
                if !seen.contains(target) {
                    return Err(ConfigError::UnknownNodeReference {
                        from: node.id.clone(),
                        to: target.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Every operator in the topology.
    #[must_use]
    pub fn nodes(&self) -> &[NodeDescriptor] {
        &self.nodes
    }

    /// Looks up an operator by id.
    #[must_use]
    pub fn node(&self, id: &NodeId) -> Option<&NodeDescriptor> {
        self.nodes.iter().find(|n| &n.id == id)
    }

    /// Iterates the non-sink connectors — the set the recovery coordinator
    /// drives restart alignment through.
    pub fn non_sink_connectors(&self) -> impl Iterator<Item = &NodeDescriptor> {
        self.nodes.iter().filter(|n| n.is_non_sink_connector())
    }

    /// Iterates every connector, sink or not.
    pub fn connectors(&self) -> impl Iterator<Item = &NodeDescriptor> {
        self.nodes.iter().filter(|n| n.is_connector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: u32, name: &str) -> NodeId {
        NodeId::new(id, name)
    }

    #[test]
    fn parses_a_linear_topology_from_json() {
        let json = r#"[
            {"id": {"index": 0, "name": "spout"}, "kind": "spout", "downstream_nodes": [{"index": 1, "name": "bolt"}]},
            {"id": {"index": 1, "name": "bolt"}, "kind": "bolt", "is_connector": true,
             "upstream_nodes": [{"index": 0, "name": "spout"}],
             "downstream_nodes": [{"index": 2, "name": "sink"}],
             "downstream_connectors": [{"index": 2, "name": "sink"}],
             "cover": [{"index": 1, "name": "bolt"}]},
            {"id": {"index": 2, "name": "sink"}, "kind": "sink", "is_connector": true,
             "upstream_nodes": [{"index": 1, "name": "bolt"}],
             "upstream_connectors": [{"index": 1, "name": "bolt"}]}
        ]"#;

        let topo = TopologyDescriptor::from_json(json).unwrap();
        assert_eq!(topo.nodes().len(), 3);
        assert_eq!(topo.non_sink_connectors().count(), 1);
        assert_eq!(topo.connectors().count(), 2);
        assert!(topo.node(&node(1, "bolt")).unwrap().is_non_sink_connector());
    }

    #[test]
    fn rejects_duplicate_node_ids() {
        let nodes = vec![
            NodeDescriptor {
                id: node(0, "a"),
                kind: NodeKind::Spout,
                is_connector: false,
                upstream_nodes: vec![],
                downstream_nodes: vec![],
                upstream_connectors: vec![],
                downstream_connectors: vec![],
                cover: vec![],
            },
            NodeDescriptor {
                id: node(0, "a"),
                kind: NodeKind::Sink,
                is_connector: false,
                upstream_nodes: vec![],
                downstream_nodes: vec![],
                upstream_connectors: vec![],
                downstream_connectors: vec![],
                cover: vec![],
            },
        ];
        let err = TopologyDescriptor::from_nodes(nodes).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateNode { .. }));
    }

    #[test]
    fn rejects_edges_to_undefined_nodes() {
        let nodes = vec![NodeDescriptor {
            id: node(0, "a"),
            kind: NodeKind::Spout,
            is_connector: false,
            upstream_nodes: vec![],
            downstream_nodes: vec![node(1, "ghost")],
            upstream_connectors: vec![],
            downstream_connectors: vec![],
            cover: vec![],
        }];
        let err = TopologyDescriptor::from_nodes(nodes).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownNodeReference { .. }));
    }
}
