//! Integration tests for the backup orchestration flow

use crate::fixtures::{list_names, write_file, LocalDirRemote};
use chrono::NaiveDate;
use sftp_backup::backup::{period_dir, sync_period};
use sftp_backup::cleanup::prune;
use sftp_backup::{Error, RetentionThreshold};
use std::fs;

#[test]
fn test_sync_downloads_the_period_into_a_flat_directory() {
    let remote_root = tempfile::tempdir().unwrap();
    write_file(remote_root.path(), "srv/2024/05/site-1.tar.gz", b"1");
    write_file(remote_root.path(), "srv/2024/05/db/db-1.sql.gz", b"2");
    write_file(remote_root.path(), "srv/2024/04/site-0.tar.gz", b"0");
    let remote = LocalDirRemote::new(remote_root.path());
    let local = tempfile::tempdir().unwrap();
    let local_dir = local.path().join("backup/site");

    let date = NaiveDate::from_ymd_opt(2024, 5, 20).unwrap();
    let summary = sync_period(&remote, &period_dir("/srv", date), &local_dir).unwrap();

    assert_eq!(summary.remote_dir, "/srv/2024/05");
    assert_eq!(summary.files_found, 2);
    assert_eq!(summary.download.downloaded, 2);
    assert_eq!(list_names(&local_dir), ["db-1.sql.gz", "site-1.tar.gz"]);
}

#[test]
fn test_empty_period_is_not_an_error() {
    let remote_root = tempfile::tempdir().unwrap();
    fs::create_dir_all(remote_root.path().join("srv/2024/06")).unwrap();
    let remote = LocalDirRemote::new(remote_root.path());
    let local = tempfile::tempdir().unwrap();
    let local_dir = local.path().join("dest");

    let summary = sync_period(&remote, "/srv/2024/06", &local_dir).unwrap();

    assert_eq!(summary.files_found, 0);
    assert_eq!(remote.transfers.get(), 0);
    assert!(!local_dir.exists());
}

#[test]
fn test_listing_failure_happens_before_any_download() {
    let remote_root = tempfile::tempdir().unwrap();
    write_file(remote_root.path(), "srv/2024/05/a.tar.gz", b"a");
    write_file(remote_root.path(), "srv/2024/05/sub/b.tar.gz", b"b");
    let remote = LocalDirRemote::new(remote_root.path()).failing_list_on("/srv/2024/05/sub");
    let local = tempfile::tempdir().unwrap();

    let err = sync_period(&remote, "/srv/2024/05", local.path()).unwrap_err();

    assert!(matches!(err, Error::Enumeration { .. }));
    assert_eq!(remote.transfers.get(), 0);
    assert!(list_names(local.path()).is_empty());
}

#[test]
fn test_backup_then_prune_keeps_the_newest() {
    let remote_root = tempfile::tempdir().unwrap();
    for day in 1..=4 {
        write_file(
            remote_root.path(),
            &format!("srv/2024/05/2024-05-0{day}_02-00_site.tar.gz"),
            b"x",
        );
    }
    let remote = LocalDirRemote::new(remote_root.path());
    let local = tempfile::tempdir().unwrap();

    sync_period(&remote, "/srv/2024/05", local.path()).unwrap();
    assert_eq!(list_names(local.path()).len(), 4);

    let deleted = prune(local.path(), RetentionThreshold::new(4).unwrap()).unwrap();
    assert!(deleted.is_empty());

    let deleted = prune(local.path(), RetentionThreshold::new(1).unwrap()).unwrap();
    assert_eq!(deleted.len(), 3);
    assert_eq!(list_names(local.path()).len(), 1);
}
