use crate::config::RetentionThreshold;
use crate::error::{Error, Result};
use crate::files::LocalFileRecord;
use std::fs;
use std::io;
use std::path::Path;
use walkdir::WalkDir;

/// Deletes the oldest files in `local_dir` until at most `threshold` remain.
///
/// Only immediate children are considered and directories are never touched.
/// A file that cannot be deleted is logged and skipped. Returns the records
/// that were actually deleted.
pub fn prune(local_dir: &Path, threshold: RetentionThreshold) -> Result<Vec<LocalFileRecord>> {
    let records = scan_local_files(local_dir)?;
    if records.is_empty() {
        log::info!("No files found in '{}', nothing to prune", local_dir.display());
        return Ok(Vec::new());
    }

    let total = records.len();
    let candidates = select_for_deletion(records, threshold);
    if candidates.is_empty() {
        log::info!(
            "{} file(s) in '{}' is within the limit of {}",
            total,
            local_dir.display(),
            threshold.get()
        );
        return Ok(Vec::new());
    }

    log::info!(
        "Pruning {} of {} file(s) in '{}' (keeping {})",
        candidates.len(),
        total,
        local_dir.display(),
        threshold.get()
    );

    Ok(delete_records(candidates))
}

/// Deletes each record's file independently. Failures are logged and the
/// file is skipped; only the records actually removed are returned.
pub fn delete_records(candidates: Vec<LocalFileRecord>) -> Vec<LocalFileRecord> {
    let mut deleted = Vec::with_capacity(candidates.len());
    for record in candidates {
        match fs::remove_file(&record.path) {
            Ok(()) => {
                log::info!("Deleted {} (created {})", record.path.display(), record.created_at);
                deleted.push(record);
            }
            Err(e) => {
                log::warn!("Could not delete {}, skipping: {}", record.path.display(), e);
            }
        }
    }
    deleted
}

/// Builds a record for every regular file directly inside `dir`.
///
/// Subdirectories are reported and skipped.
pub fn scan_local_files(dir: &Path) -> Result<Vec<LocalFileRecord>> {
    if !dir.exists() {
        return Err(Error::NotFound(dir.to_path_buf()));
    }
    if !dir.is_dir() {
        return Err(Error::fs(
            dir,
            io::Error::new(io::ErrorKind::InvalidInput, "not a directory"),
        ));
    }

    log::info!("Getting list of files in '{}'", dir.display());
    let mut records = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(dir).to_path_buf();
            Error::fs(path, e.into())
        })?;

        if entry.file_type().is_dir() {
            log::warn!("Skipping directory '{}'", entry.path().display());
            continue;
        }

        match LocalFileRecord::from_path(entry.path()) {
            Ok(record) => records.push(record),
            Err(Error::NotImplemented(reason)) => log::warn!("Skipping: {}", reason),
            Err(Error::Filesystem { path, source }) if source.kind() == io::ErrorKind::NotFound => {
                log::warn!("'{}' vanished during the scan, skipping", path.display());
            }
            Err(e) => return Err(e),
        }
    }

    log::debug!("Found {} file(s) in '{}'", records.len(), dir.display());
    Ok(records)
}

/// Sorts by creation time (oldest first, stable) and returns the records
/// beyond the threshold.
pub fn select_for_deletion(
    mut records: Vec<LocalFileRecord>,
    threshold: RetentionThreshold,
) -> Vec<LocalFileRecord> {
    if records.len() <= threshold.get() {
        return Vec::new();
    }

    records.sort_by_key(|r| r.created_at);
    let delete_count = records.len() - threshold.get();
    records.truncate(delete_count);
    records
}
