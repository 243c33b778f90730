//! Metadata records for files in the local backup destination.

use crate::error::{Error, Result};
use chrono::{DateTime, Local};
use std::fs;
use std::path::{Path, PathBuf};

/// A regular file found during a local scan. Never built for directories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFileRecord {
    pub name: String,
    pub path: PathBuf,
    /// All trailing dot segments, e.g. `.tar.gz`.
    pub extension: String,
    pub parent: PathBuf,
    pub created_at: DateTime<Local>,
    pub modified_at: DateTime<Local>,
    pub size_in_bytes: u64,
}

impl LocalFileRecord {
    /// Builds a record from the file's current metadata.
    ///
    /// Directories yield [`Error::NotImplemented`]: retention is flat and does
    /// not descend into subdirectories. Filesystems without a birth time fall
    /// back to the modification time for `created_at`.
    pub fn from_path(path: &Path) -> Result<Self> {
        let metadata = fs::metadata(path).map_err(|e| Error::fs(path, e))?;
        if metadata.is_dir() {
            return Err(Error::NotImplemented(format!(
                "recursive retention is not supported, '{}' is a directory",
                path.display()
            )));
        }

        let modified = metadata.modified().map_err(|e| Error::fs(path, e))?;
        let created = metadata.created().unwrap_or_else(|_| {
            log::trace!("No birth time for {}, using mtime", path.display());
            modified
        });

        Ok(LocalFileRecord {
            name: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            path: path.to_path_buf(),
            extension: file_extension(path),
            parent: path.parent().map(Path::to_path_buf).unwrap_or_default(),
            created_at: DateTime::<Local>::from(created),
            modified_at: DateTime::<Local>::from(modified),
            size_in_bytes: metadata.len(),
        })
    }
}

/// Extension made of every trailing dot segment of the file name:
/// `backup.tar.gz` gives `.tar.gz`, `README` gives an empty string.
///
/// Leading dots (hidden files) do not start an extension. A directory gives
/// an empty string and a warning.
pub fn file_extension(path: &Path) -> String {
    if path.is_dir() {
        log::warn!("'{}' is a directory, it has no extension", path.display());
        return String::new();
    }

    let name = match path.file_name() {
        Some(name) => name.to_string_lossy(),
        None => return String::new(),
    };
    extension_of(&name).to_string()
}

pub(crate) fn extension_of(name: &str) -> &str {
    if name.ends_with('.') {
        return "";
    }
    let stem_start = name.len() - name.trim_start_matches('.').len();
    match name[stem_start..].find('.') {
        Some(idx) => &name[stem_start + idx..],
        None => "",
    }
}
