use crate::error::{Error, Result};
use crate::remote::{remote_basename, RemoteFs};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DownloadSummary {
    pub downloaded: usize,
    pub skipped: usize,
    pub bytes: u64,
}

/// Copies each remote file into `local_dest`, named by its basename only.
///
/// Files whose local target already exists are skipped without comparison,
/// so two remote files with the same name in different directories produce
/// one local copy. The destination directory is created before the first
/// transfer. The first failed transfer aborts the batch and may leave a
/// partial file behind.
pub fn download_all<R: RemoteFs + ?Sized>(
    remote: &R,
    remote_files: &[String],
    local_dest: &Path,
) -> Result<DownloadSummary> {
    let mut summary = DownloadSummary::default();
    let mut dest_ready = false;
    let total = remote_files.len();

    for (idx, remote_path) in remote_files.iter().enumerate() {
        let name = remote_basename(remote_path);
        if name.is_empty() || name == "." || name == ".." {
            log::warn!("Remote path '{}' has no file name, skipping", remote_path);
            summary.skipped += 1;
            continue;
        }

        let local_path = local_dest.join(name);
        if local_path.exists() {
            log::debug!(
                "'{}' already exists at {}, skipping download",
                name,
                local_path.display()
            );
            summary.skipped += 1;
            continue;
        }

        if !dest_ready {
            if !local_dest.exists() {
                log::info!("Creating local destination {}", local_dest.display());
            }
            fs::create_dir_all(local_dest).map_err(|e| Error::fs(local_dest, e))?;
            dest_ready = true;
        }

        log::info!(
            "[{}/{}] Downloading {} to {}",
            idx + 1,
            total,
            remote_path,
            local_path.display()
        );
        let bytes = remote
            .download(remote_path, &local_path)
            .map_err(|source| Error::Transfer {
                remote: remote_path.clone(),
                local: local_path.clone(),
                source,
            })?;

        summary.downloaded += 1;
        summary.bytes += bytes;
    }

    log::info!(
        "Downloaded {} file(s) ({} bytes), skipped {} already present",
        summary.downloaded,
        summary.bytes,
        summary.skipped
    );
    Ok(summary)
}
