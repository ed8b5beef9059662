//! File replacement without partial writes.
//!
//! New content goes to a temporary file in the destination's directory and is
//! renamed over the destination once it is complete and synced. A failure at
//! any step drops the temporary file and leaves the destination as it was.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::{debug, trace};

/// Atomically replace (or create) `path` with `contents`.
///
/// When `path` already exists its permissions are carried over to the new
/// file. A symlink is followed and its target replaced; the link itself is
/// left in place.
///
/// # Errors
///
/// Returns an error if a symlink cannot be resolved, or if the temporary file
/// cannot be created, written, synced or renamed into place.
pub fn write_atomic(path: &Path, contents: &[u8]) -> io::Result<()> {
    let resolved;
    let path = match fs::symlink_metadata(path) {
        Ok(meta) if meta.file_type().is_symlink() => {
            resolved = fs::canonicalize(path)?;
            trace!(link = %path.display(), target = %resolved.display(), "Following symlink");
            resolved.as_path()
        }
        _ => path,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir)?;
    trace!(tmp = %tmp.path().display(), "Created temporary file");

    tmp.write_all(contents)?;
    tmp.flush()?;
    tmp.as_file().sync_all()?;

    match fs::metadata(path) {
        Ok(meta) => fs::set_permissions(tmp.path(), meta.permissions())?,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => return Err(err),
    }

    tmp.persist(path).map_err(|err| err.error)?;
    debug!(path = %path.display(), bytes = contents.len(), "Replaced file");
    Ok(())
}
