pub mod output;
pub mod walker;

pub use walker::{walk, walk_collect, DirectoryWalker, EXCLUDED_DIRS};

use crate::core::ParseWarning;
use crate::errors::{Error, Result};
use std::fs;
use std::path::Path;

/// Read a whole file as UTF-8, turning failures into a warning tagged with
/// `source` so the caller can skip the file and keep scanning.
pub fn read_source(path: &Path, source: &str) -> std::result::Result<String, ParseWarning> {
    fs::read_to_string(path).map_err(|e| ParseWarning::at(source, path, e.to_string()))
}

/// Read an optional file: `Ok(None)` when it does not exist.
pub fn read_optional(
    path: &Path,
    source: &str,
) -> std::result::Result<Option<String>, ParseWarning> {
    match fs::read_to_string(path) {
        Ok(contents) => Ok(Some(contents)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(ParseWarning::at(source, path, e.to_string())),
    }
}

/// Fail fast when a repository root cannot be used at all.
pub fn ensure_repository(path: &Path) -> Result<()> {
    let metadata = fs::metadata(path).map_err(|e| Error::io(path, e))?;
    if metadata.is_dir() {
        Ok(())
    } else {
        Err(Error::io(
            path,
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a directory"),
        ))
    }
}

pub fn file_exists(path: &Path) -> bool {
    path.is_file()
}

pub fn dir_exists(path: &Path) -> bool {
    path.is_dir()
}
