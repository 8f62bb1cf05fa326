// SPDX-License-Identifier: Apache-2.0

//! [`PendingWindow`]: the per-operator durable output buffer.

use crate::ack_queues::AckQueues;
use crate::operator::Operator;
use crate::state::WindowState;
use flowkeep_model::{NodeId, Tuple, Version, VersionAck, WindowError};
use flowkeep_segment::SegmentStore;
use std::path::Path;

/// The per-operator durable output buffer.
///
/// Owns a backup directory exclusively: the current segment, the sealed
/// segments, the `safe_version` file, and (for non-sink operators) the
/// per-downstream-connector ack queues. A sink operator is constructed with
/// `downstream_connectors: None` and has no ack machinery at all — its
/// truncation is driven entirely by the recovery coordinator during restart.
#[derive(Debug)]
pub struct PendingWindow {
    store: SegmentStore,
    safe_version: Version,
    ack_queues: Option<AckQueues>,
    state: WindowState,
}

impl PendingWindow {
    /// Creates a fresh backup directory (which must not already exist),
    /// initializes `safe_version` to `0`, opens an empty current segment,
    /// and — if `downstream_connectors` is `Some`, i.e. this is not a sink
    /// — initializes one empty ack queue per downstream connector.
    ///
    /// The window starts in [`WindowState::Active`].
    ///
    /// # Errors
    ///
    /// Returns [`WindowError::IoError`] if the directory already exists or
    /// cannot be created.
    pub fn create(
        backup_dir: &Path,
        downstream_connectors: Option<&[NodeId]>,
    ) -> Result<Self, WindowError> {
        let store = SegmentStore::create_dir(backup_dir)?;
        flowkeep_segment::safe_version::init(backup_dir)?;
        Ok(Self {
            store,
            safe_version: 0,
            ack_queues: downstream_connectors.map(AckQueues::new),
            state: WindowState::Active,
        })
    }

    /// Reattaches to an already-existing backup directory, reading back its
    /// persisted `safe_version`. Used by the recovery coordinator, which
    /// needs read/write authority over a window before the operator that
    /// owns it resumes running. The window starts in
    /// [`WindowState::Recovering`].
    ///
    /// # Errors
    ///
    /// Returns [`WindowError::IoError`] if the directory or its
    /// `safe_version` file cannot be read, or [`WindowError::InvariantViolation`]
    /// if `safe_version` does not contain a decimal integer.
    pub fn open_existing(
        backup_dir: &Path,
        downstream_connectors: Option<&[NodeId]>,
    ) -> Result<Self, WindowError> {
        let store = SegmentStore::open_existing(backup_dir)?;
        let safe_version = flowkeep_segment::safe_version::read(backup_dir)?;
        Ok(Self {
            store,
            safe_version,
            ack_queues: downstream_connectors.map(AckQueues::new),
            state: WindowState::Recovering,
        })
    }

    /// The backup directory this window exclusively owns.
    #[must_use]
    pub fn backup_dir(&self) -> &Path {
        self.store.dir()
    }

    /// The highest version known to have been durably handled by every
    /// downstream branch, as of the last truncation.
    #[must_use]
    pub fn safe_version(&self) -> Version {
        self.safe_version
    }

    /// The window's current lifecycle state.
    #[must_use]
    pub fn state(&self) -> WindowState {
        self.state
    }

    /// `true` for a sink window, which holds no ack queues.
    #[must_use]
    pub fn is_sink(&self) -> bool {
        self.ack_queues.is_none()
    }

    /// The set of sealed segment versions currently retained, ascending.
    ///
    /// # Errors
    ///
    /// Returns [`WindowError::IoError`] if the backup directory cannot be
    /// listed.
    pub fn sealed_versions(&self) -> Result<Vec<Version>, WindowError> {
        self.store.list_sealed()
    }

    /// Writes `tuple` durably. If `tuple` is a barrier with version `v`,
    /// seals the current segment to `v` and opens a fresh current segment.
    /// Legal only in [`WindowState::Active`].
    ///
    /// # Errors
    ///
    /// Returns [`WindowError::IoError`] on write or seal failure, or
    /// [`WindowError::InvariantViolation`] if the window is not `Active`.
    pub fn append(&mut self, tuple: &Tuple) -> Result<(), WindowError> {
        self.state.require_active()?;
        self.store.append(tuple)?;
        if let Some(version) = tuple.barrier_version() {
            self.store.seal(version)?;
        }
        Ok(())
    }

    /// Equivalent to calling [`Self::append`] for each tuple in order. No
    /// atomicity across the batch beyond what a single `append` guarantees.
    ///
    /// # Errors
    ///
    /// Returns the first error encountered; tuples before it have already
    /// been durably appended.
    pub fn extend(&mut self, tuples: &[Tuple]) -> Result<(), WindowError> {
        for tuple in tuples {
            self.append(tuple)?;
        }
        Ok(())
    }

    /// Records `ack` and, if every downstream queue's head now equals the
    /// same version, truncates up to it and pops one head from each queue.
    /// Legal in [`WindowState::Active`] (a live downstream connector acking)
    /// and in [`WindowState::Recovering`] (the recovery coordinator
    /// completing in-flight acks against an upstream connector's window);
    /// undefined (returns [`WindowError::InvariantViolation`]) for a sink
    /// window.
    ///
    /// An ack from an unregistered channel is logged and dropped, not
    /// treated as fatal (`UnknownChannel`).
    ///
    /// # Errors
    ///
    /// Returns [`WindowError::InvariantViolation`] if called on a sink
    /// window or outside `Active` state, or propagates an I/O failure from
    /// the resulting truncation.
    pub fn handle_version_ack(&mut self, ack: VersionAck) -> Result<(), WindowError> {
        self.state.require_active_or_recovering()?;

        let quorum = {
            let queues = self.ack_queues.as_mut().ok_or_else(|| {
                WindowError::InvariantViolation(format!(
                    "handle_version_ack is undefined for sink window at {}",
                    self.store.dir().display()
                ))
            })?;
            match queues.record(&ack.sent_from, ack.version) {
                Ok(()) => {}
                Err(WindowError::UnknownChannel { channel }) => {
                    tracing::warn!(
                        %channel,
                        version = ack.version,
                        "dropping version ack from unknown channel"
                    );
                    return Ok(());
                }
                Err(err) => return Err(err),
            }
            queues.quorum_version()
        };

        if let Some(version) = quorum {
            self.truncate_inner(version)?;
            if let Some(queues) = self.ack_queues.as_mut() {
                queues.pop_heads();
            }
        }
        Ok(())
    }

    /// Rewrites `safe_version` to `v` and deletes every sealed segment
    /// whose name is `<= v`. Idempotent for repeat `v`; never deletes the
    /// current segment. Legal only in [`WindowState::Recovering`] or
    /// [`WindowState::Replaying`] — truncation triggered internally by ack
    /// quorum runs regardless of this gate, since it is part of `Active`
    /// operation.
    ///
    /// # Errors
    ///
    /// Returns [`WindowError::InvariantViolation`] if the window is
    /// `Active` or `Closed`, or an I/O error from the underlying deletes.
    pub fn truncate(&mut self, v: Version) -> Result<(), WindowError> {
        self.state.require_recovering_or_replaying()?;
        self.truncate_inner(v)
    }

    fn truncate_inner(&mut self, v: Version) -> Result<(), WindowError> {
        flowkeep_segment::safe_version::write(self.store.dir(), v)?;
        for sealed in self.store.list_sealed()? {
            if sealed <= v {
                self.store.delete_sealed(sealed)?;
            }
        }
        self.safe_version = v;
        tracing::debug!(version = v, dir = %self.store.dir().display(), "truncated pending window");
        Ok(())
    }

    /// Deletes every sealed segment whose name is `> v`, deletes the
    /// current segment, then opens a fresh empty current segment. Used
    /// only during recovery, never during normal processing.
    ///
    /// # Errors
    ///
    /// Returns [`WindowError::InvariantViolation`] outside `Recovering`/
    /// `Replaying`, or an I/O error from the underlying deletes.
    pub fn rewind(&mut self, v: Version) -> Result<(), WindowError> {
        self.state.require_recovering_or_replaying()?;
        for sealed in self.store.list_sealed()? {
            if sealed > v {
                self.store.delete_sealed(sealed)?;
            }
        }
        self.store.reset_current()?;
        tracing::debug!(version = v, dir = %self.store.dir().display(), "rewound pending window");
        Ok(())
    }

    /// For each sealed segment in ascending version order, deserializes its
    /// tuples and hands them to `operator.multicast(downstream_nodes, ..)`.
    /// Tuples within a segment replay in append order. Never touches the
    /// current segment, which is presumed empty post-rewind.
    ///
    /// # Errors
    ///
    /// Returns [`WindowError::InvariantViolation`] outside `Recovering`/
    /// `Replaying`, [`WindowError::CorruptSegment`] if a sealed segment has
    /// a torn record before its end, or propagates a `multicast` failure.
    pub fn replay(
        &mut self,
        operator: &mut dyn Operator,
        downstream_nodes: &[NodeId],
    ) -> Result<(), WindowError> {
        self.state.require_recovering_or_replaying()?;
        for version in self.store.list_sealed()? {
            let tuples = self.store.read_sealed(version)?;
            operator.multicast(downstream_nodes, &tuples)?;
        }
        Ok(())
    }

    /// `Active → Recovering`: entered once at restart, before the recovery
    /// coordinator takes transient authority over this window.
    ///
    /// # Errors
    ///
    /// Returns [`WindowError::InvariantViolation`] if not currently `Active`.
    pub fn enter_recovery(&mut self) -> Result<(), WindowError> {
        self.state.require_active()?;
        self.state = WindowState::Recovering;
        Ok(())
    }

    /// `Recovering → Replaying`: entered once the operator's state and this
    /// window have been aligned to a common cut.
    ///
    /// # Errors
    ///
    /// Returns [`WindowError::InvariantViolation`] if not currently
    /// `Recovering`.
    pub fn begin_replay(&mut self) -> Result<(), WindowError> {
        if self.state != WindowState::Recovering {
            return Err(WindowError::InvariantViolation(format!(
                "begin_replay requires Recovering state, window is {:?}",
                self.state
            )));
        }
        self.state = WindowState::Replaying;
        Ok(())
    }

    /// `Replaying → Active`: normal processing resumes once the final
    /// segment has been replayed.
    ///
    /// # Errors
    ///
    /// Returns [`WindowError::InvariantViolation`] if not currently
    /// `Replaying`.
    pub fn finish_replay(&mut self) -> Result<(), WindowError> {
        if self.state != WindowState::Replaying {
            return Err(WindowError::InvariantViolation(format!(
                "finish_replay requires Replaying state, window is {:?}",
                self.state
            )));
        }
        self.state = WindowState::Active;
        Ok(())
    }

    /// Retires this window. No further calls are legal afterwards.
    pub fn close(&mut self) {
        self.state = WindowState::Closed;
    }
}
