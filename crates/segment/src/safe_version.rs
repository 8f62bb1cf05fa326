// SPDX-License-Identifier: Apache-2.0

//! The durable `safe_version` file: an ASCII decimal integer, no trailing
//! bytes, recording the highest version for which truncation has completed.

use crate::SAFE_VERSION_FILE_NAME;
use flowkeep_model::{Version, WindowError};
use std::fs::{self, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::Path;

/// Initializes `safe_version` to `0` in a freshly created backup directory.
pub fn init(dir: &Path) -> Result<(), WindowError> {
    write(dir, 0)
}

/// Reads the current safe version from `dir`.
pub fn read(dir: &Path) -> Result<Version, WindowError> {
    let path = dir.join(SAFE_VERSION_FILE_NAME);
    let contents =
        fs::read_to_string(&path).map_err(|e| WindowError::io(SAFE_VERSION_FILE_NAME, e))?;
    contents.trim().parse::<Version>().map_err(|_| {
        WindowError::InvariantViolation(format!(
            "safe_version file at {} does not contain a decimal integer: {contents:?}",
            path.display()
        ))
    })
}

/// Rewrites `safe_version` to `version`, truncating any trailing bytes.
pub fn write(dir: &Path, version: Version) -> Result<(), WindowError> {
    let path = dir.join(SAFE_VERSION_FILE_NAME);
    let mut file = OpenOptions::new()
        .create(true)
        .write(true)
        .open(&path)
        .map_err(|e| WindowError::io(SAFE_VERSION_FILE_NAME, e))?;
    file.seek(SeekFrom::Start(0))
        .map_err(|e| WindowError::io(SAFE_VERSION_FILE_NAME, e))?;
    file.write_all(version.to_string().as_bytes())
        .map_err(|e| WindowError::io(SAFE_VERSION_FILE_NAME, e))?;
    let len = file
        .stream_position()
        .map_err(|e| WindowError::io(SAFE_VERSION_FILE_NAME, e))?;
    file.set_len(len)
        .map_err(|e| WindowError::io(SAFE_VERSION_FILE_NAME, e))?;
    file.sync_all()
        .map_err(|e| WindowError::io(SAFE_VERSION_FILE_NAME, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_growing_and_shrinking_values() {
        let dir = tempfile::tempdir().unwrap();
        init(dir.path()).unwrap();
        assert_eq!(read(dir.path()).unwrap(), 0);

        write(dir.path(), 42).unwrap();
        assert_eq!(read(dir.path()).unwrap(), 42);

        // A shorter decimal string must not leave trailing bytes behind.
        write(dir.path(), 7).unwrap();
        assert_eq!(read(dir.path()).unwrap(), 7);
        let raw = fs::read_to_string(dir.path().join(SAFE_VERSION_FILE_NAME)).unwrap();
        assert_eq!(raw, "7");
    }
}
