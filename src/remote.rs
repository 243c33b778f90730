//! Remote file access and recursive tree walking.

use crate::error::{Error, Result};
use std::io;
use std::path::Path;

/// One entry of a remote directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEntry {
    pub name: String,
    pub is_dir: bool,
}

/// The file-transfer operations the walker and downloader need.
///
/// Implemented for `ssh2::Sftp` in [`crate::ssh`]. Listings must not contain
/// the `.` and `..` entries.
pub trait RemoteFs {
    fn list_dir(&self, path: &str) -> io::Result<Vec<RemoteEntry>>;

    /// Copies `remote_path` into a newly created `local_path`, returning the
    /// number of bytes written.
    fn download(&self, remote_path: &str, local_path: &Path) -> io::Result<u64>;
}

/// Lists every file reachable under `remote_root`, depth-first and pre-order.
///
/// Any listing failure aborts the walk; a partial file list is never returned.
pub fn list_all_files<R: RemoteFs + ?Sized>(remote: &R, remote_root: &str) -> Result<Vec<String>> {
    let root = match remote_root.trim_end_matches('/') {
        "" if remote_root.starts_with('/') => "/",
        "" => ".",
        trimmed => trimmed,
    };

    log::info!("Listing files under remote path '{}'", root);
    let mut files = Vec::new();
    walk(remote, root, &mut files)?;
    log::debug!("Found {} file(s) under '{}'", files.len(), root);

    Ok(files)
}

fn walk<R: RemoteFs + ?Sized>(remote: &R, dir: &str, files: &mut Vec<String>) -> Result<()> {
    let entries = remote.list_dir(dir).map_err(|source| Error::Enumeration {
        path: dir.to_string(),
        source,
    })?;

    for entry in entries {
        let path = join_remote(dir, &entry.name);
        if entry.is_dir {
            walk(remote, &path, files)?;
        } else {
            files.push(path);
        }
    }

    Ok(())
}

/// Joins remote path segments with `/` regardless of the local platform.
pub fn join_remote(dir: &str, name: &str) -> String {
    if dir.ends_with('/') {
        format!("{dir}{name}")
    } else {
        format!("{dir}/{name}")
    }
}

/// Final segment of a remote path.
pub fn remote_basename(path: &str) -> &str {
    path.trim_end_matches('/').rsplit('/').next().unwrap_or("")
}
