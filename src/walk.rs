//! Recursive content discovery.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum WalkError {
    #[error("cannot read {}: {source}", path.display())]
    Discovery {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// List every file under `dir`, descending into all subdirectories.
///
/// Returned paths are `dir` joined with each entry's relative path. Entries
/// are visited depth-first and sorted by file name within each directory, so
/// the sequence is stable across filesystems. Anything that is not a
/// directory counts as a file, including symlinks.
///
/// `dir` itself must be a directory. The first unreadable directory aborts
/// the whole listing.
pub fn list_files(dir: &Path) -> Result<Vec<PathBuf>, WalkError> {
    let meta = fs::metadata(dir).map_err(|source| WalkError::Discovery {
        path: dir.to_path_buf(),
        source,
    })?;
    if !meta.is_dir() {
        return Err(WalkError::Discovery {
            path: dir.to_path_buf(),
            source: io::Error::new(io::ErrorKind::NotADirectory, "not a directory"),
        });
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|err| WalkError::Discovery {
            path: err
                .path()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| dir.to_path_buf()),
            source: err.into(),
        })?;
        if !entry.file_type().is_dir() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}
