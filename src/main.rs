// SPDX-License-Identifier: Apache-2.0

//! `flowkeep`: the launcher binary exposing the two cluster start modes —
//! `new` (fresh topology) and `restart` (cluster recovery) — around the
//! pending window and recovery coordinator library crates.
//!
//! The operator execution loop, tuple routing fabric, and configuration
//! loader are out of scope for this core; this binary stands in for the
//! launcher only as far as wiring the pending window and recovery
//! coordinator together. `restart` mode replays retained segments through
//! a stand-in operator that logs what it would have delivered, since no
//! real operator implementation lives in this workspace.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use flowkeep_config::{NodeKind, TopologyDescriptor};
use flowkeep_model::{NodeId, Tuple, Version, WindowError};
use flowkeep_recovery::{FsSnapshotCatalog, NodeHandle, RecoveryCoordinator, SimpleNodeHandle};
use flowkeep_window::{Operator, PendingWindow};

/// Durable pending-window buffering and cluster restart recovery for a
/// streaming dataflow runtime.
#[derive(Parser, Debug)]
#[command(name = "flowkeep", version, about)]
struct Cli {
    #[command(subcommand)]
    mode: Mode,

    /// Root directory the snapshot catalog is rooted at.
    #[arg(long, global = true, default_value = "catalog")]
    catalog_dir: PathBuf,
}

#[derive(Subcommand, Debug)]
enum Mode {
    /// Fresh topology: wipe and recreate the pickled-nodes, backup, and
    /// computing-state directories, then exit.
    New,
    /// Cluster restart: run the recovery coordinator against the given
    /// topology, then exit.
    Restart {
        /// Path to a topology descriptor (JSON or YAML, by extension).
        #[arg(long)]
        topology: PathBuf,
        /// Root directory holding one pending-window backup directory per
        /// operator, named by that operator's `NodeId` index.
        #[arg(long)]
        backup_dir: PathBuf,
    },
}

const PICKLED_NODES_DIR: &str = "pickled_nodes";
const BACKUP_DIR: &str = "backup";
const COMPUTING_STATE_DIR: &str = "computing_state";

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let catalog = FsSnapshotCatalog::new(&cli.catalog_dir);

    let result = match cli.mode {
        Mode::New => run_new(&catalog),
        Mode::Restart {
            topology,
            backup_dir,
        } => run_restart(&catalog, &topology, &backup_dir),
    };

    if let Err(ref err) = result {
        tracing::error!(error = %err, "flowkeep exiting with failure");
    }
    result
}

/// Wipes and recreates the pickled-nodes, backup, and computing-state
/// directories. Topology configuration and launching the operator
/// execution loop are out of scope for this core.
fn run_new(catalog: &FsSnapshotCatalog) -> Result<()> {
    use flowkeep_recovery::SnapshotCatalog;

    for dir in [PICKLED_NODES_DIR, BACKUP_DIR, COMPUTING_STATE_DIR] {
        catalog
            .delete(dir, true)
            .with_context(|| format!("wiping {dir}"))?;
        catalog
            .makedirs(dir)
            .with_context(|| format!("recreating {dir}"))?;
        tracing::info!(dir, "recreated");
    }
    Ok(())
}

/// Loads `topology`, reattaches every operator's pending window under
/// `backup_dir`, and runs the recovery coordinator to completion.
fn run_restart(
    catalog: &FsSnapshotCatalog,
    topology_path: &Path,
    backup_dir: &Path,
) -> Result<()> {
    let topology = load_topology(topology_path)?;
    let mut nodes: HashMap<NodeId, SimpleNodeHandle> = HashMap::new();

    for node in topology.nodes() {
        let dir = backup_dir.join(node.id.index().to_string());
        let latest = flowkeep_segment::list_sealed_versions(&dir)
            .with_context(|| format!("listing sealed segments for {}", node.id))?
            .into_iter()
            .max()
            .unwrap_or(0);

        let downstream_connectors = (node.kind != NodeKind::Sink)
            .then(|| node.downstream_connectors.clone());
        let window = PendingWindow::open_existing(&dir, downstream_connectors.as_deref())
            .with_context(|| format!("reattaching pending window for {}", node.id))?;

        let operator = StandInOperator { latest };
        nodes.insert(
            node.id.clone(),
            SimpleNodeHandle::new(Box::new(operator), window),
        );
    }

    let coordinator = RecoveryCoordinator::new(clone_catalog(catalog), topology);
    coordinator
        .recover(&mut nodes)
        .context("recovery coordinator failed")?;

    for (id, mut handle) in nodes {
        if handle.pending_window_mut().state() == flowkeep_window::WindowState::Recovering {
            handle.pending_window_mut().begin_replay()?;
            let (operator, window) = handle.split_mut();
            window.replay(operator, &[])?;
            handle.pending_window_mut().finish_replay()?;
        }
        tracing::info!(node = %id, "operator realigned and ready to resume");
    }

    Ok(())
}

fn clone_catalog(catalog: &FsSnapshotCatalog) -> FsSnapshotCatalog {
    catalog.clone()
}

fn load_topology(path: &Path) -> Result<TopologyDescriptor> {
    let contents =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => Ok(TopologyDescriptor::from_json(&contents)?),
        _ => Ok(TopologyDescriptor::from_yaml(&contents)?),
    }
}

/// Stands in for the (out-of-scope) operator execution loop during
/// `restart`: its `latest_version` is seeded from the pending window's own
/// retained segments, and `multicast` only logs what it would have
/// delivered.
struct StandInOperator {
    latest: Version,
}

impl Operator for StandInOperator {
    fn multicast(&mut self, downstream: &[NodeId], tuples: &[Tuple]) -> Result<(), WindowError> {
        tracing::info!(
            downstream = ?downstream,
            count = tuples.len(),
            "replayed retained tuples (operator execution loop is out of scope)"
        );
        Ok(())
    }

    fn restore(&mut self, version: Version) -> Result<(), WindowError> {
        self.latest = version;
        Ok(())
    }

    fn latest_version(&self) -> Version {
        self.latest
    }
}

