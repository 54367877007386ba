// SPDX-License-Identifier: MIT

//! Atomic write-then-rename, the substrate for spec invariant 3 ("Job
//! atomicity") and the §4.9 status cache's slot writes.

use crate::error::StorageError;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Write `bytes` to `path` by writing a sibling `.tmp` file, fsyncing it,
/// then renaming it into place. A crash at any point before the rename
/// leaves the previous contents of `path` untouched.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StorageError> {
    let tmp_path = sibling_tmp_path(path);

    {
        let file = File::create(&tmp_path).map_err(|e| StorageError::io(&tmp_path, e))?;
        let mut writer = BufWriter::new(file);
        writer
            .write_all(bytes)
            .map_err(|e| StorageError::io(&tmp_path, e))?;
        let file = writer
            .into_inner()
            .map_err(|e| StorageError::io(&tmp_path, e.into_error()))?;
        file.sync_all().map_err(|e| StorageError::io(&tmp_path, e))?;
    }

    std::fs::rename(&tmp_path, path).map_err(|e| StorageError::io(path, e))?;
    Ok(())
}

fn sibling_tmp_path(path: &Path) -> std::path::PathBuf {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{file_name}.tmp.{}", std::process::id()))
}
