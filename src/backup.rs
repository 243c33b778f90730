use crate::config::ConnectionProfile;
use crate::download::{download_all, DownloadSummary};
use crate::error::Result;
use crate::remote::{join_remote, list_all_files, RemoteFs};
use crate::ssh::with_session;
use chrono::{Datelike, Local, NaiveDate};
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackupSummary {
    pub remote_dir: String,
    pub files_found: usize,
    pub download: DownloadSummary,
}

/// `YYYY/MM` for the backup period containing `date`.
pub fn period_subpath(date: NaiveDate) -> String {
    format!("{:04}/{:02}", date.year(), date.month())
}

/// Remote directory for the period: `<remote_base>/YYYY/MM`.
pub fn period_dir(remote_base: &str, date: NaiveDate) -> String {
    join_remote(remote_base, &period_subpath(date))
}

/// Downloads the current month's backups from `remote_base` into `local_base`.
///
/// Pruning is left to the caller.
pub fn run_backup(profile: &ConnectionProfile, remote_base: &str, local_base: &Path) -> Result<BackupSummary> {
    run_backup_for(profile, remote_base, local_base, Local::now().date_naive())
}

pub fn run_backup_for(
    profile: &ConnectionProfile,
    remote_base: &str,
    local_base: &Path,
    date: NaiveDate,
) -> Result<BackupSummary> {
    let remote_dir = period_dir(remote_base, date);
    log::info!(
        "Starting SFTP backup of {}:{} into {}",
        profile.host,
        remote_dir,
        local_base.display()
    );

    let summary = with_session(profile, |session| {
        let sftp = session.sftp()?;
        sync_period(sftp, &remote_dir, local_base)
    })?;

    log::info!("Transferred backups to {}", local_base.display());
    Ok(summary)
}

/// Walks `remote_dir` completely, then downloads whatever is missing locally.
///
/// An empty remote directory is a warning, not an error.
pub fn sync_period<R: RemoteFs + ?Sized>(remote: &R, remote_dir: &str, local_dir: &Path) -> Result<BackupSummary> {
    let files = list_all_files(remote, remote_dir)?;
    if files.is_empty() {
        log::warn!("No files found in remote path '{}'", remote_dir);
        return Ok(BackupSummary {
            remote_dir: remote_dir.to_string(),
            ..BackupSummary::default()
        });
    }

    log::debug!(
        "Downloading {} file(s) from '{}' to '{}'",
        files.len(),
        remote_dir,
        local_dir.display()
    );
    let download = download_all(remote, &files, local_dir)?;

    Ok(BackupSummary {
        remote_dir: remote_dir.to_string(),
        files_found: files.len(),
        download,
    })
}

/// Lists the files of the current period without downloading anything.
pub fn list_period(profile: &ConnectionProfile, remote_base: &str, date: NaiveDate) -> Result<Vec<String>> {
    let remote_dir = period_dir(remote_base, date);
    with_session(profile, |session| list_all_files(session.sftp()?, &remote_dir))
}
