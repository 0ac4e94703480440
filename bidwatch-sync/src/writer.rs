//! Atomic file replacement.
//!
//! ## `atomic_write` protocol
//!
//! 1. Stat the target; remember its permission bits if it exists.
//! 2. Create `<name>.tmp-XXXXXX` in the target's own directory.
//! 3. Copy the remembered permission bits onto the temp file.
//! 4. Write the content and `fsync` it.
//! 5. Close the temp file and rename it over the target (atomic on POSIX).
//!
//! Any failure before step 5 completes drops the temp file, which deletes
//! it; the target is never observed half-written.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::Path;

use crate::error::{io_err, SyncError};

/// Atomically replace `path` with `content`.
///
/// A target that does not exist yet is created with the temp file's
/// default (owner read/write) permissions.
pub fn atomic_write(path: &Path, content: &[u8]) -> Result<(), SyncError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let original_permissions = match fs::metadata(path) {
        Ok(meta) => Some(meta.permissions()),
        Err(err) if err.kind() == ErrorKind::NotFound => None,
        Err(err) => return Err(io_err(path, err)),
    };

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "config".to_string());

    let mut tmp = tempfile::Builder::new()
        .prefix(&format!("{file_name}.tmp-"))
        .tempfile_in(dir)
        .map_err(|e| io_err(dir, e))?;

    if let Some(permissions) = original_permissions {
        tmp.as_file()
            .set_permissions(permissions)
            .map_err(|e| io_err(tmp.path(), e))?;
    }

    tmp.write_all(content).map_err(|e| io_err(tmp.path(), e))?;
    tmp.as_file()
        .sync_all()
        .map_err(|e| io_err(tmp.path(), e))?;

    // Closes the handle; the path is still removed on drop until persisted.
    let tmp_path = tmp.into_temp_path();
    tmp_path.persist(path).map_err(|e| io_err(path, e.error))?;

    tracing::info!("wrote: {}", path.display());
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
