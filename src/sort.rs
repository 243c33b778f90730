//! Moves timestamped backups into `<year>/<month>/<day>` subdirectories.

use crate::error::{Error, Result};
use crate::files::extension_of;
use chrono::{Datelike, NaiveDateTime};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M";
const TIMESTAMP_LEN: usize = "YYYY-MM-DD_HH-MM".len();

pub const DEFAULT_EXTENSIONS: &[&str] = &[".tar.gz"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortedFile {
    pub from: PathBuf,
    pub to: PathBuf,
    pub timestamp: NaiveDateTime,
}

/// First `YYYY-MM-DD_HH-MM` timestamp found anywhere in `name`.
pub fn extract_timestamp(name: &str) -> Option<NaiveDateTime> {
    let bytes = name.as_bytes();
    if bytes.len() < TIMESTAMP_LEN {
        return None;
    }

    (0..=bytes.len() - TIMESTAMP_LEN).find_map(|start| {
        let window = std::str::from_utf8(&bytes[start..start + TIMESTAMP_LEN]).ok()?;
        NaiveDateTime::parse_from_str(window, TIMESTAMP_FORMAT).ok()
    })
}

/// `<root>/<YYYY>/<MM>/<DD>/<name>`
pub fn dated_destination(root: &Path, timestamp: NaiveDateTime, name: &str) -> PathBuf {
    root.join(format!("{:04}", timestamp.year()))
        .join(format!("{:02}", timestamp.month()))
        .join(format!("{:02}", timestamp.day()))
        .join(name)
}

/// Sorts the files directly inside `src_dir` whose extension is one of
/// `extensions` into dated subdirectories of `src_dir`.
///
/// Files without a timestamp in their name, and files whose destination is
/// already taken, are left in place. With `dry_run` nothing is moved.
pub fn sort_into_date_dirs(src_dir: &Path, extensions: &[&str], dry_run: bool) -> Result<Vec<SortedFile>> {
    if !src_dir.exists() {
        return Err(Error::NotFound(src_dir.to_path_buf()));
    }
    if !src_dir.is_dir() {
        return Err(Error::fs(
            src_dir,
            io::Error::new(io::ErrorKind::InvalidInput, "not a directory"),
        ));
    }

    let mut sorted = Vec::new();
    for entry in WalkDir::new(src_dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| Error::fs(src_dir, io::Error::from(e)))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let name = entry.file_name().to_string_lossy().into_owned();
        if !extensions.contains(&extension_of(&name)) {
            continue;
        }

        let Some(timestamp) = extract_timestamp(&name) else {
            log::warn!("No timestamp in '{}', leaving it in place", name);
            continue;
        };

        let to = dated_destination(src_dir, timestamp, &name);
        if to.exists() {
            log::warn!("{} already exists, not moving {}", to.display(), name);
            continue;
        }

        if dry_run {
            log::info!("Would move {} to {}", name, to.display());
        } else {
            if let Some(parent) = to.parent() {
                fs::create_dir_all(parent).map_err(|e| Error::fs(parent, e))?;
            }
            fs::rename(entry.path(), &to).map_err(|e| Error::fs(entry.path(), e))?;
            log::info!("Moved {} to {}", name, to.display());
        }

        sorted.push(SortedFile {
            from: entry.path().to_path_buf(),
            to,
            timestamp,
        });
    }

    Ok(sorted)
}
