// SPDX-License-Identifier: Apache-2.0

//! The snapshot catalog: an opaque durable store for operator state
//! snapshots and the pickled topology.
//!
//! This is an interface-only contract: the real store is a distributed
//! filesystem client, out of scope for this core. [`FsSnapshotCatalog`] is
//! the one reference implementation, backed by `std::fs`, provided because
//! a crate whose central trait has no implementation at all would be
//! untestable — not a stand-in for the real DFS client.

use crate::error::RecoveryError;
use std::fs;
use std::path::PathBuf;

/// Durable operations the recovery coordinator needs against an external
/// snapshot store: `read`, `write`, `list`,
/// `delete`, `makedirs`, `rename`. The core never introspects the bytes it
/// reads or writes through this trait.
pub trait SnapshotCatalog {
    /// Reads the full contents of `path`.
    ///
    /// # Errors
    ///
    /// Returns [`RecoveryError::Catalog`] if `path` cannot be read.
    fn read(&self, path: &str) -> Result<Vec<u8>, RecoveryError>;

    /// Writes `bytes` to `path`. `write` need not be atomic — the core
    /// uses rename-to-commit for anything that needs atomicity (segment
    /// sealing, handled entirely within `flowkeep-segment`).
    ///
    /// # Errors
    ///
    /// Returns [`RecoveryError::Catalog`] if the write fails, or if `path`
    /// already exists and `overwrite` is `false`.
    fn write(&self, path: &str, bytes: &[u8], overwrite: bool) -> Result<(), RecoveryError>;

    /// Lists the entry names directly under `dir`.
    ///
    /// # Errors
    ///
    /// Returns [`RecoveryError::Catalog`] if `dir` cannot be listed.
    fn list(&self, dir: &str) -> Result<Vec<String>, RecoveryError>;

    /// Deletes `path`. If `recursive` is `true` and `path` is a directory,
    /// deletes its contents too.
    ///
    /// # Errors
    ///
    /// Returns [`RecoveryError::Catalog`] if the delete fails.
    fn delete(&self, path: &str, recursive: bool) -> Result<(), RecoveryError>;

    /// Creates `dir`, including any missing parent directories.
    ///
    /// # Errors
    ///
    /// Returns [`RecoveryError::Catalog`] if the directories cannot be
    /// created.
    fn makedirs(&self, dir: &str) -> Result<(), RecoveryError>;

    /// Renames `src` to `dst`. A rename within a single directory is
    /// atomic with respect to directory listing.
    ///
    /// # Errors
    ///
    /// Returns [`RecoveryError::Catalog`] if the rename fails.
    fn rename(&self, src: &str, dst: &str) -> Result<(), RecoveryError>;
}

/// A [`SnapshotCatalog`] backed by the local filesystem, rooted at one
/// directory.
#[derive(Debug, Clone)]
pub struct FsSnapshotCatalog {
    root: PathBuf,
}

impl FsSnapshotCatalog {
    /// Builds a catalog rooted at `root`. Does not create `root` — call
    /// [`SnapshotCatalog::makedirs`] with an empty path if it must be
    /// created fresh.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path)
    }
}

impl SnapshotCatalog for FsSnapshotCatalog {
    fn read(&self, path: &str) -> Result<Vec<u8>, RecoveryError> {
        fs::read(self.resolve(path)).map_err(RecoveryError::Catalog)
    }

    fn write(&self, path: &str, bytes: &[u8], overwrite: bool) -> Result<(), RecoveryError> {
        let resolved = self.resolve(path);
        if !overwrite && resolved.exists() {
            return Err(RecoveryError::Catalog(std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                format!("{} already exists", resolved.display()),
            )));
        }
        if let Some(parent) = resolved.parent() {
            fs::create_dir_all(parent).map_err(RecoveryError::Catalog)?;
        }
        fs::write(resolved, bytes).map_err(RecoveryError::Catalog)
    }

    fn list(&self, dir: &str) -> Result<Vec<String>, RecoveryError> {
        let resolved = self.resolve(dir);
        let mut names = Vec::new();
        for entry in fs::read_dir(&resolved).map_err(RecoveryError::Catalog)? {
            let entry = entry.map_err(RecoveryError::Catalog)?;
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_owned());
            }
        }
        names.sort();
        Ok(names)
    }

    fn delete(&self, path: &str, recursive: bool) -> Result<(), RecoveryError> {
        let resolved = self.resolve(path);
        let result = if recursive {
            fs::remove_dir_all(&resolved)
        } else if resolved.is_dir() {
            fs::remove_dir(&resolved)
        } else {
            fs::remove_file(&resolved)
        };
        match result {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(RecoveryError::Catalog(e)),
        }
    }

    fn makedirs(&self, dir: &str) -> Result<(), RecoveryError> {
        fs::create_dir_all(self.resolve(dir)).map_err(RecoveryError::Catalog)
    }

    fn rename(&self, src: &str, dst: &str) -> Result<(), RecoveryError> {
        let dst_resolved = self.resolve(dst);
        if let Some(parent) = dst_resolved.parent() {
            fs::create_dir_all(parent).map_err(RecoveryError::Catalog)?;
        }
        fs::rename(self.resolve(src), dst_resolved).map_err(RecoveryError::Catalog)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_read_list_delete_round_trip() {
        let tmp = tempfile::tempdir().unwrap();
        let catalog = FsSnapshotCatalog::new(tmp.path());

        catalog.write("nodes/1.snapshot", b"hello", true).unwrap();
        assert_eq!(catalog.read("nodes/1.snapshot").unwrap(), b"hello");
        assert_eq!(catalog.list("nodes").unwrap(), vec!["1.snapshot"]);

        catalog.delete("nodes/1.snapshot", false).unwrap();
        assert!(catalog.list("nodes").unwrap().is_empty());
    }

    #[test]
    fn write_without_overwrite_rejects_existing_path() {
        let tmp = tempfile::tempdir().unwrap();
        let catalog = FsSnapshotCatalog::new(tmp.path());
        catalog.write("x", b"1", true).unwrap();
        let err = catalog.write("x", b"2", false).unwrap_err();
        assert!(matches!(err, RecoveryError::Catalog(_)));
    }

    #[test]
    fn rename_is_visible_as_a_single_directory_entry_swap() {
        let tmp = tempfile::tempdir().unwrap();
        let catalog = FsSnapshotCatalog::new(tmp.path());
        catalog.write("current", b"data", true).unwrap();
        catalog.rename("current", "1").unwrap();
        assert_eq!(catalog.list("").unwrap(), vec!["1"]);
    }

    #[test]
    fn delete_is_idempotent_on_a_missing_path() {
        let tmp = tempfile::tempdir().unwrap();
        let catalog = FsSnapshotCatalog::new(tmp.path());
        catalog.delete("missing", false).unwrap();
    }
}
