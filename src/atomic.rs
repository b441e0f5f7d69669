//! Temp-file + rename writes.
//!
//! Every artifact the tool produces (WAV files, reports) goes through
//! [`write_atomically`]: the content is written to a named temporary file in
//! the destination directory, flushed to disk, then renamed over the final
//! path.  An interrupted run therefore leaves either the complete file or
//! nothing at the final path.

use std::fs::File;
use std::io;
use std::path::Path;

use tempfile::NamedTempFile;

/// Write `path` by handing a temporary file to `write`, then renaming it into
/// place once `write` succeeds.
///
/// The temporary file is created next to `path` so the final rename never
/// crosses a filesystem boundary.  When `write` fails the temporary file is
/// removed and the error is returned unchanged.
pub fn write_atomically<F, E>(path: &Path, write: F) -> Result<(), E>
where
    F: FnOnce(&mut File) -> Result<(), E>,
    E: From<io::Error>,
{
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir)?;
    write(tmp.as_file_mut())?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| E::from(e.error))?;
    Ok(())
}
