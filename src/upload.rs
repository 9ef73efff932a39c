//! Upload guard: filename pattern check and exclusive, non-overwriting
//! file creation.

use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use crate::dates::filename_matches;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("invalid file name format, please use YYYY.MM.pdf")]
    InvalidFilename,
    #[error("file already exists, please rename the file and try again")]
    Duplicate,
    #[error("failed to store uploaded file: {0}")]
    Io(#[from] std::io::Error),
}

/// Validate the filename and write the upload, refusing to overwrite.
///
/// The pattern check doubles as sanitization: a matching name contains no
/// path separators, so the original filename is safe to use verbatim as the
/// uniqueness key. `create_new` makes the existence-check-then-write atomic
/// per filename, so a concurrent duplicate upload loses with [`UploadError::Duplicate`]
/// and the pre-existing file is left untouched.
pub fn guard_and_store(dir: &Path, filename: &str, bytes: &[u8]) -> Result<PathBuf, UploadError> {
    if !filename_matches(filename) {
        return Err(UploadError::InvalidFilename);
    }

    let path = dir.join(filename);
    let file = match OpenOptions::new().write(true).create_new(true).open(&path) {
        Ok(f) => f,
        Err(e) if e.kind() == ErrorKind::AlreadyExists => return Err(UploadError::Duplicate),
        Err(e) => return Err(UploadError::Io(e)),
    };

    write_or_discard(&path, file, bytes)?;
    info!("Stored upload {:?} ({} bytes)", path, bytes.len());
    Ok(path)
}

/// Write the upload body, removing the file again if the write fails.
///
/// The filename is the uniqueness key: a partial fragment left behind after
/// a failed write (disk full, IO error) would block every retry of that
/// month with [`UploadError::Duplicate`]. A document only exists once it was
/// written completely.
fn write_or_discard(
    path: &Path,
    mut dst: impl Write,
    bytes: &[u8],
) -> Result<(), UploadError> {
    if let Err(e) = dst.write_all(bytes).and_then(|_| dst.flush()) {
        let _ = std::fs::remove_file(path);
        return Err(UploadError::Io(e));
    }
    Ok(())
}
