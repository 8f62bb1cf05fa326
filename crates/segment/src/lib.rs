// SPDX-License-Identifier: Apache-2.0

//! Durable log segment storage.
//!
//! A backup directory holds one open, append-only `current` segment and
//! zero or more sealed segments, each named by the decimal version of the
//! `BarrierTuple` that closed it. [`SegmentStore`] is the single type that
//! owns that directory's segment files; [`safe_version`] manages the
//! sibling `safe_version` file. Neither type tracks ack queues or decides
//! when to truncate — that policy lives one layer up, in the pending
//! window.

pub mod safe_version;
mod store;

pub use store::SegmentStore;

/// Name of the open, append-only segment file.
pub const CURRENT_FILE_NAME: &str = "current";

/// Name of the file holding the durable safe-version integer.
pub const SAFE_VERSION_FILE_NAME: &str = "safe_version";

use flowkeep_model::Version;
use std::fs;
use std::path::Path;

/// Returns the set of sealed segment versions present in `dir`, ignoring
/// the `current` sentinel and the `safe_version` file. Unparseable entries
/// are ignored, mirroring the source's `f.isdigit()` filter.
pub fn list_sealed_versions(dir: &Path) -> Result<Vec<Version>, flowkeep_model::WindowError> {
    let mut versions = Vec::new();
    let entries = fs::read_dir(dir).map_err(|e| flowkeep_model::WindowError::io("dir", e))?;
    for entry in entries {
        let entry = entry.map_err(|e| flowkeep_model::WindowError::io("dir", e))?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if name == CURRENT_FILE_NAME || name == SAFE_VERSION_FILE_NAME {
            continue;
        }
        if let Ok(version) = name.parse::<Version>() {
            versions.push(version);
        }
    }
    versions.sort_unstable();
    Ok(versions)
}
