//! Filesystem utilities for crash-safe writes.

use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;

/// Replace the file at `path` with `data` atomically.
///
/// The bytes go to a temp file in the same directory first; it is synced
/// and then renamed over `path`, so readers see either the old document
/// or the new one, never a truncated write.
pub fn atomic_write(path: &Path, data: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(data)?;
    tmp.as_file().sync_data()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
