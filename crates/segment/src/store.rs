// SPDX-License-Identifier: Apache-2.0

//! [`SegmentStore`]: append, seal-by-rename, list, read, and delete for the
//! sealed-and-current segment files in one backup directory.

use crate::CURRENT_FILE_NAME;
use flowkeep_model::frame::{self, ReadOutcome};
use flowkeep_model::{Tuple, Version, WindowError};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Seek};
use std::path::{Path, PathBuf};

/// Owns the segment files (`current` plus sealed, version-named files) in
/// one operator's backup directory.
///
/// Does not own the `safe_version` file (see [`crate::safe_version`]) and
/// does not track ack queues or truncation policy — that is the pending
/// window's job, one layer up.
#[derive(Debug)]
pub struct SegmentStore {
    dir: PathBuf,
    current: File,
}

impl SegmentStore {
    /// Creates `dir` (which must not already exist) and opens a fresh,
    /// empty current segment inside it.
    pub fn create_dir(dir: &Path) -> Result<Self, WindowError> {
        fs::create_dir(dir).map_err(|e| WindowError::io(dir.display().to_string(), e))?;
        Self::open_current(dir)
    }

    /// Opens the current segment of an already-existing backup directory,
    /// appending to whatever it already contains. Used when reattaching to
    /// a live directory (e.g. during recovery, before `rewind` runs).
    pub fn open_existing(dir: &Path) -> Result<Self, WindowError> {
        Self::open_current(dir)
    }

    fn open_current(dir: &Path) -> Result<Self, WindowError> {
        let current = OpenOptions::new()
            .create(true)
            .append(true)
            .open(dir.join(CURRENT_FILE_NAME))
            .map_err(|e| WindowError::io(CURRENT_FILE_NAME, e))?;
        Ok(Self {
            dir: dir.to_path_buf(),
            current,
        })
    }

    /// The backup directory this store owns.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Appends `tuple` to the current segment and fsyncs before returning,
    /// so the write is recoverable by a subsequent `replay` after a crash.
    pub fn append(&mut self, tuple: &Tuple) -> Result<(), WindowError> {
        frame::write_tuple(&mut self.current, tuple)
            .map_err(|e| WindowError::io(CURRENT_FILE_NAME, e))?;
        self.current
            .sync_all()
            .map_err(|e| WindowError::io(CURRENT_FILE_NAME, e))
    }

    /// Flushes and closes the current segment, atomically renames it to
    /// `version`, then opens a fresh empty current segment.
    pub fn seal(&mut self, version: Version) -> Result<(), WindowError> {
        self.current
            .sync_all()
            .map_err(|e| WindowError::io(CURRENT_FILE_NAME, e))?;

        let current_path = self.dir.join(CURRENT_FILE_NAME);
        let sealed_path = self.dir.join(version.to_string());
        fs::rename(&current_path, &sealed_path)
            .map_err(|e| WindowError::io(CURRENT_FILE_NAME, e))?;

        let fresh = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .append(true)
            .open(&current_path)
            .map_err(|e| WindowError::io(CURRENT_FILE_NAME, e))?;
        self.current = fresh;
        tracing::debug!(version, "sealed segment");
        Ok(())
    }

    /// The set of sealed versions present, ascending.
    pub fn list_sealed(&self) -> Result<Vec<Version>, WindowError> {
        crate::list_sealed_versions(&self.dir)
    }

    /// Deserializes every tuple in sealed segment `version`, in append
    /// order. Tolerates a torn trailing record (stops and returns what was
    /// read so far); a checksum mismatch on an otherwise-complete frame is
    /// reported as [`WindowError::CorruptSegment`].
    pub fn read_sealed(&self, version: Version) -> Result<Vec<Tuple>, WindowError> {
        let path = self.dir.join(version.to_string());
        let mut file =
            File::open(&path).map_err(|e| WindowError::io(version.to_string(), e))?;
        let mut tuples = Vec::new();
        loop {
            match frame::read_frame(&mut file) {
                Ok(ReadOutcome::Tuple(t)) => tuples.push(t),
                Ok(ReadOutcome::Eof) => break,
                Ok(ReadOutcome::Torn) => {
                    tracing::warn!(
                        version,
                        "torn trailing record in sealed segment; stopping replay of this segment"
                    );
                    break;
                }
                Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                    let offset = file.stream_position().unwrap_or(0);
                    return Err(WindowError::CorruptSegment { version, offset });
                }
                Err(e) => return Err(WindowError::io(version.to_string(), e)),
            }
        }
        Ok(tuples)
    }

    /// Deletes sealed segment `version`. Idempotent: a missing file is not
    /// an error.
    pub fn delete_sealed(&self, version: Version) -> Result<(), WindowError> {
        let path = self.dir.join(version.to_string());
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(WindowError::io(version.to_string(), e)),
        }
    }

    /// Deletes the current segment (if any) and opens a fresh, empty one
    /// in its place. Used by `rewind`; never called during normal
    /// processing.
    pub fn reset_current(&mut self) -> Result<(), WindowError> {
        let current_path = self.dir.join(CURRENT_FILE_NAME);
        match fs::remove_file(&current_path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(WindowError::io(CURRENT_FILE_NAME, e)),
        }
        self.current = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .append(true)
            .open(&current_path)
            .map_err(|e| WindowError::io(CURRENT_FILE_NAME, e))?;
        Ok(())
    }
}
