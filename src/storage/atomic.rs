use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;

use crate::error::KeyResult;

/// Create every missing parent directory of `path`
pub fn ensure_parent_dir(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent),
        _ => Ok(()),
    }
}

/// Replace `path` with `contents`, so that readers see either the old file
/// or the complete new one
pub fn write_atomic(path: &Path, contents: &[u8]) -> KeyResult<()> {
    write_atomic_with(path, |file| file.write_all(contents))
}

/// Like [`write_atomic`], with the payload produced by `fill`.
///
/// The temporary file lives in the destination directory and is removed if
/// `fill`, the flush or the sync fails.
pub fn write_atomic_with<F>(path: &Path, fill: F) -> KeyResult<()>
where
    F: FnOnce(&mut File) -> io::Result<()>,
{
    ensure_parent_dir(path)?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp = NamedTempFile::new_in(dir)?;
    fill(temp.as_file_mut())?;
    temp.as_file_mut().flush()?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;

    log::debug!("wrote {}", crate::utils::display_name(path));
    Ok(())
}
