// SPDX-License-Identifier: Apache-2.0

//! End-to-end scenarios exercising a single pending window across its full
//! append / ack / truncate / rewind / replay lifecycle.

use flowkeep_model::{BarrierTuple, DataTuple, NodeId, Tuple, Version, VersionAck, WindowError};
use flowkeep_window::{Operator, PendingWindow};

fn node(n: u32, name: &str) -> NodeId {
    NodeId::new(n, name)
}

fn data(seq: u64) -> Tuple {
    Tuple::Data(DataTuple {
        producer: node(0, "spout"),
        seq,
        payload: vec![seq as u8],
    })
}

fn barrier(version: Version) -> Tuple {
    Tuple::Barrier(BarrierTuple {
        producer: node(0, "spout"),
        version,
    })
}

struct RecordingOperator {
    delivered: Vec<Tuple>,
}

impl Operator for RecordingOperator {
    fn multicast(&mut self, _downstream: &[NodeId], tuples: &[Tuple]) -> Result<(), WindowError> {
        self.delivered.extend_from_slice(tuples);
        Ok(())
    }

    fn restore(&mut self, _version: Version) -> Result<(), WindowError> {
        Ok(())
    }

    fn latest_version(&self) -> Version {
        0
    }
}

#[test]
fn two_channel_quorum_truncates_only_the_acked_segment() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path().join("op");
    let a = node(1, "a");
    let b = node(2, "b");
    let mut w = PendingWindow::create(&dir, Some(&[a.clone(), b.clone()])).unwrap();

    w.append(&data(1)).unwrap();
    w.append(&barrier(1)).unwrap();
    w.append(&data(2)).unwrap();
    w.append(&barrier(2)).unwrap();

    assert_eq!(w.sealed_versions().unwrap(), vec![1, 2]);
    assert_eq!(w.safe_version(), 0);

    w.handle_version_ack(VersionAck::new(a, 1)).unwrap();
    w.handle_version_ack(VersionAck::new(b, 1)).unwrap();

    assert_eq!(w.sealed_versions().unwrap(), vec![2]);
    assert_eq!(w.safe_version(), 1);
    assert!(dir.join("current").exists());
}

#[test]
fn quorum_held_by_slow_branch() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path().join("op");
    let a = node(1, "a");
    let b = node(2, "b");
    let mut w = PendingWindow::create(&dir, Some(&[a.clone(), b.clone()])).unwrap();

    w.append(&barrier(1)).unwrap();
    w.append(&barrier(2)).unwrap();

    w.handle_version_ack(VersionAck::new(a.clone(), 1)).unwrap();
    w.handle_version_ack(VersionAck::new(a, 2)).unwrap();
    w.handle_version_ack(VersionAck::new(b.clone(), 1)).unwrap();

    assert_eq!(w.safe_version(), 1);
    assert_eq!(w.sealed_versions().unwrap(), vec![2]);

    w.handle_version_ack(VersionAck::new(b, 2)).unwrap();
    assert_eq!(w.safe_version(), 2);
    assert!(w.sealed_versions().unwrap().is_empty());
}

#[test]
fn crash_mid_segment_replays_exactly_the_sealed_prefix() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path().join("op");
    let downstream = node(1, "downstream");
    let mut w = PendingWindow::create(&dir, Some(&[downstream.clone()])).unwrap();

    w.append(&data(1)).unwrap();
    w.append(&barrier(1)).unwrap();
    w.append(&data(2)).unwrap();
    // crash: barrier 2 never arrives, `current` holds an unsealed data(2).
    drop(w);

    let mut w = PendingWindow::open_existing(&dir, Some(&[downstream.clone()])).unwrap();
    w.rewind(1).unwrap();
    assert_eq!(w.sealed_versions().unwrap(), vec![1]);

    w.begin_replay().unwrap();
    let mut operator = RecordingOperator { delivered: Vec::new() };
    w.replay(&mut operator, &[downstream]).unwrap();
    w.finish_replay().unwrap();

    assert_eq!(operator.delivered, vec![data(1), barrier(1)]);
}

#[test]
fn rewind_past_live_data_drops_only_the_newer_segments() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path().join("op");
    let downstream = node(1, "downstream");
    let mut w = PendingWindow::create(&dir, Some(&[downstream])).unwrap();

    w.append(&barrier(1)).unwrap();
    w.append(&barrier(2)).unwrap();
    w.append(&barrier(3)).unwrap();
    w.enter_recovery().unwrap();
    w.truncate(1).unwrap();

    w.rewind(2).unwrap();

    assert_eq!(w.sealed_versions().unwrap(), vec![1, 2]);
    assert_eq!(std::fs::metadata(dir.join("current")).unwrap().len(), 0);
}

#[test]
fn sink_window_is_never_driven_by_its_own_acks() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path().join("sink");
    let mut w = PendingWindow::create(&dir, None).unwrap();
    assert!(w.is_sink());

    w.append(&barrier(1)).unwrap();
    assert_eq!(w.sealed_versions().unwrap(), vec![1]);

    let err = w
        .handle_version_ack(VersionAck::new(node(9, "x"), 1))
        .unwrap_err();
    assert!(matches!(err, WindowError::InvariantViolation(_)));

    // Only a coordinator-driven truncate touches a sink's segments.
    w.enter_recovery().unwrap();
    w.truncate(1).unwrap();
    assert!(w.sealed_versions().unwrap().is_empty());
}
