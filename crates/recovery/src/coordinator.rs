// SPDX-License-Identifier: Apache-2.0

//! [`RecoveryCoordinator`]: the four-phase cluster restart driver
//! (load snapshots, complete in-flight acks, align cuts, persist).

use crate::catalog::SnapshotCatalog;
use crate::error::RecoveryError;
use crate::node_handle::NodeHandle;
use flowkeep_config::TopologyDescriptor;
use flowkeep_model::{NodeId, VersionAck};
use flowkeep_window::WindowState;
use std::collections::HashMap;

/// Drives one cluster-wide restart: collects per-connector latest
/// versions, completes in-flight acks, aligns every operator and pending
/// window to a common cut, and persists the result.
///
/// Holds no per-operator state itself — every node it touches is reached
/// through the `nodes` map passed to [`Self::recover`], so that the same
/// coordinator can be reused (or rebuilt cheaply) across restarts.
pub struct RecoveryCoordinator<C: SnapshotCatalog> {
    catalog: C,
    topology: TopologyDescriptor,
}

impl<C: SnapshotCatalog> RecoveryCoordinator<C> {
    /// Builds a coordinator for `topology`, using `catalog` as its
    /// snapshot store.
    #[must_use]
    pub fn new(catalog: C, topology: TopologyDescriptor) -> Self {
        Self { catalog, topology }
    }

    /// The topology this coordinator is driving restart for.
    #[must_use]
    pub fn topology(&self) -> &TopologyDescriptor {
        &self.topology
    }

    /// Runs all four recovery phases against `nodes`: load, complete
    /// in-flight acks, align cuts, persist. Any per-operator failure is
    /// fatal to the whole restart — `recover` returns on the
    /// first error rather than attempting partial progress.
    ///
    /// # Errors
    ///
    /// Returns [`RecoveryError::MissingNodeHandle`] if the topology names a
    /// node absent from `nodes`, or propagates a [`RecoveryError::Window`]
    /// or [`RecoveryError::Catalog`] failure from any phase.
    pub fn recover<N: NodeHandle>(
        &self,
        nodes: &mut HashMap<NodeId, N>,
    ) -> Result<(), RecoveryError> {
        tracing::info!("recovery phase 1: loading operator snapshots");
        let snapshots = self.phase1_load_snapshots()?;

        tracing::info!("recovery phase 2: completing in-flight acks");
        self.phase2_complete_inflight_acks(nodes)?;

        tracing::info!("recovery phase 3: aligning cuts");
        self.phase3_align_cuts(nodes)?;

        tracing::info!("recovery phase 4: persisting snapshots");
        self.phase4_persist_snapshots(&snapshots)?;

        tracing::info!("recovery complete");
        Ok(())
    }

    /// Reads every operator's opaque state snapshot into memory.
    ///
    /// The core never introspects these bytes; they are read here only so
    /// they can be written straight back in Phase 4, a read-then-rewrite
    /// round trip rather than anything the core needs to understand.
    fn phase1_load_snapshots(&self) -> Result<HashMap<NodeId, Vec<u8>>, RecoveryError> {
        let mut snapshots = HashMap::new();
        for node in self.topology.nodes() {
            let bytes = self.catalog.read(&snapshot_path(&node.id))?;
            snapshots.insert(node.id.clone(), bytes);
        }
        Ok(snapshots)
    }

    /// For every non-spout connector, synthesizes a [`VersionAck`] at its
    /// latest version into each of its upstream connectors' pending
    /// windows. Closes out acks that were in flight when the cluster
    /// crashed, and prevents a slow survivor from dragging the new run.
    fn phase2_complete_inflight_acks<N: NodeHandle>(
        &self,
        nodes: &mut HashMap<NodeId, N>,
    ) -> Result<(), RecoveryError> {
        for descriptor in self.topology.connectors() {
            let c_id = descriptor.id.clone();
            let latest = handle_mut(nodes, &c_id)?.operator_mut().latest_version();

            for upstream in &descriptor.upstream_connectors {
                let ack = VersionAck::new(c_id.clone(), latest);
                handle_mut(nodes, upstream)?
                    .pending_window_mut()
                    .handle_version_ack(ack)?;
            }
        }
        Ok(())
    }

    /// For every connector, restores its operator state and rewinds its
    /// pending window to its own latest version; for non-sink connectors,
    /// also restores every operator in its `cover` set to the connector's
    /// persisted safe version.
    fn phase3_align_cuts<N: NodeHandle>(
        &self,
        nodes: &mut HashMap<NodeId, N>,
    ) -> Result<(), RecoveryError> {
        for descriptor in self.topology.connectors() {
            let c_id = descriptor.id.clone();
            let handle = handle_mut(nodes, &c_id)?;
            let latest = handle.operator_mut().latest_version();
            handle.operator_mut().restore(latest)?;

            let window = handle.pending_window_mut();
            if window.state() == WindowState::Active {
                window.enter_recovery()?;
            }
            window.rewind(latest)?;

            tracing::info!(
                node = %c_id,
                version = latest,
                "connector restored and pending window rewound"
            );

            if !descriptor.is_non_sink_connector() {
                continue;
            }
            let safe_version = handle_mut(nodes, &c_id)?
                .pending_window_mut()
                .safe_version();

            for covered in &descriptor.cover {
                handle_mut(nodes, covered)?
                    .operator_mut()
                    .restore(safe_version)?;
                tracing::info!(node = %covered, version = safe_version, "covered operator restored");
            }
        }
        Ok(())
    }

    /// Rewrites every operator's snapshot in the catalog.
    fn phase4_persist_snapshots(
        &self,
        snapshots: &HashMap<NodeId, Vec<u8>>,
    ) -> Result<(), RecoveryError> {
        for node in self.topology.nodes() {
            if let Some(bytes) = snapshots.get(&node.id) {
                self.catalog
                    .write(&snapshot_path(&node.id), bytes, true)?;
            }
        }
        Ok(())
    }
}

/// The catalog path an operator's state snapshot is stored at.
fn snapshot_path(id: &NodeId) -> String {
    format!("{}.snapshot", id.index())
}

fn handle_mut<'a, N: NodeHandle>(
    nodes: &'a mut HashMap<NodeId, N>,
    id: &NodeId,
) -> Result<&'a mut N, RecoveryError> {
    nodes
        .get_mut(id)
        .ok_or_else(|| RecoveryError::MissingNodeHandle { id: id.clone() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::FsSnapshotCatalog;
    use crate::node_handle::SimpleNodeHandle;
    use flowkeep_config::{NodeDescriptor, NodeKind};
    use flowkeep_model::{Tuple, Version, WindowError};
    use flowkeep_window::{Operator, PendingWindow};
    use std::sync::{Arc, Mutex};

    fn node(idx: u32, name: &str) -> NodeId {
        NodeId::new(idx, name)
    }

    #[derive(Clone, Default)]
    struct FakeOperator {
        latest: Arc<Mutex<Version>>,
        restored_to: Arc<Mutex<Option<Version>>>,
    }

    impl Operator for FakeOperator {
        fn multicast(&mut self, _downstream: &[NodeId], _tuples: &[Tuple]) -> Result<(), WindowError> {
            Ok(())
        }

        fn restore(&mut self, version: Version) -> Result<(), WindowError> {
            *self.restored_to.lock().unwrap() = Some(version);
            Ok(())
        }

        fn latest_version(&self) -> Version {
            *self.latest.lock().unwrap()
        }
    }

    /// Spout(0) -> connectorA(1) -> connectorB/sink(2), matching the
    /// "Restart alignment" end-to-end scenario.
    fn linear_topology() -> TopologyDescriptor {
        let spout = node(0, "spout");
        let a = node(1, "connectorA");
        let b = node(2, "connectorB");
        TopologyDescriptor::from_nodes(vec![
            NodeDescriptor {
                id: spout.clone(),
                kind: NodeKind::Spout,
                is_connector: false,
                upstream_nodes: vec![],
                downstream_nodes: vec![a.clone()],
                upstream_connectors: vec![],
                downstream_connectors: vec![a.clone()],
                cover: vec![],
            },
            NodeDescriptor {
                id: a.clone(),
                kind: NodeKind::Bolt,
                is_connector: true,
                upstream_nodes: vec![spout.clone()],
                downstream_nodes: vec![b.clone()],
                upstream_connectors: vec![],
                downstream_connectors: vec![b.clone()],
                cover: vec![a.clone()],
            },
            NodeDescriptor {
                id: b.clone(),
                kind: NodeKind::Sink,
                is_connector: true,
                upstream_nodes: vec![a.clone()],
                downstream_nodes: vec![],
                upstream_connectors: vec![a.clone()],
                downstream_connectors: vec![],
                cover: vec![],
            },
        ])
        .unwrap()
    }

    #[test]
    fn restart_alignment_completes_acks_and_restores_cover_set() {
        let tmp = tempfile::tempdir().unwrap();
        let topology = linear_topology();
        let a = node(1, "connectorA");
        let b = node(2, "connectorB");

        let catalog = FsSnapshotCatalog::new(tmp.path().join("catalog"));
        for n in topology.nodes() {
            catalog.write(&snapshot_path(&n.id), b"snap", true).unwrap();
        }

        let a_window_dir = tmp.path().join("backup").join("1");
        let mut a_window = PendingWindow::create(&a_window_dir, Some(&[b.clone()])).unwrap();
        a_window
            .append(&flowkeep_model::Tuple::Barrier(flowkeep_model::BarrierTuple {
                producer: a.clone(),
                version: 5,
            }))
            .unwrap();

        let a_operator = FakeOperator {
            latest: Arc::new(Mutex::new(5)),
            ..Default::default()
        };
        let b_operator = FakeOperator {
            latest: Arc::new(Mutex::new(4)),
            ..Default::default()
        };
        let b_window_dir = tmp.path().join("backup").join("2");
        let b_window = PendingWindow::create(&b_window_dir, None).unwrap();

        let mut nodes: HashMap<NodeId, SimpleNodeHandle> = HashMap::new();
        nodes.insert(
            a.clone(),
            SimpleNodeHandle::new(Box::new(a_operator.clone()), a_window),
        );
        nodes.insert(
            b.clone(),
            SimpleNodeHandle::new(Box::new(b_operator.clone()), b_window),
        );

        let coordinator = RecoveryCoordinator::new(catalog, topology);
        coordinator.recover(&mut nodes).unwrap();

        // Phase 2: B's latest (4) is synthesized as an ack into A's window.
        // Phase 3: A is restored and rewound to its own latest (5); A's
        // cover set (itself) is restored to A's safe_version (4, from the
        // synthesized ack).
        assert_eq!(*a_operator.restored_to.lock().unwrap(), Some(4));
        let a_handle = nodes.get_mut(&a).unwrap();
        assert_eq!(a_handle.pending_window_mut().safe_version(), 4);
    }

    #[test]
    fn recover_fails_fast_when_a_node_handle_is_missing() {
        let tmp = tempfile::tempdir().unwrap();
        let topology = linear_topology();
        let catalog = FsSnapshotCatalog::new(tmp.path());
        for n in topology.nodes() {
            catalog.write(&snapshot_path(&n.id), b"x", true).unwrap();
        }
        let coordinator = RecoveryCoordinator::new(catalog, topology);
        let mut nodes: HashMap<NodeId, SimpleNodeHandle> = HashMap::new();
        let err = coordinator.recover(&mut nodes).unwrap_err();
        assert!(matches!(err, RecoveryError::MissingNodeHandle { .. }));
    }
}
