//! Integration tests for the remote tree walker

use crate::fixtures::{write_file, LocalDirRemote};
use sftp_backup::remote::list_all_files;
use sftp_backup::Error;
use std::fs;

#[test]
fn test_walk_returns_files_of_one_period_only() {
    let remote_root = tempfile::tempdir().unwrap();
    write_file(remote_root.path(), "backups/2024/05/a.tar.gz", b"a");
    write_file(remote_root.path(), "backups/2024/05/b.tar.gz", b"b");
    write_file(remote_root.path(), "backups/2024/05/db/c.sql.gz", b"c");
    fs::create_dir_all(remote_root.path().join("backups/2024/06")).unwrap();

    let remote = LocalDirRemote::new(remote_root.path());

    let may = list_all_files(&remote, "/backups/2024/05").unwrap();
    assert_eq!(
        may,
        [
            "/backups/2024/05/a.tar.gz",
            "/backups/2024/05/b.tar.gz",
            "/backups/2024/05/db/c.sql.gz",
        ]
    );

    let june = list_all_files(&remote, "/backups/2024/06").unwrap();
    assert!(june.is_empty());
}

#[test]
fn test_walk_is_depth_first_pre_order() {
    let remote_root = tempfile::tempdir().unwrap();
    write_file(remote_root.path(), "r/a.tar.gz", b"");
    write_file(remote_root.path(), "r/m/deep/b.tar.gz", b"");
    write_file(remote_root.path(), "r/m/c.tar.gz", b"");
    write_file(remote_root.path(), "r/z.tar.gz", b"");

    let remote = LocalDirRemote::new(remote_root.path());
    let files = list_all_files(&remote, "/r/").unwrap();

    assert_eq!(files, ["/r/a.tar.gz", "/r/m/c.tar.gz", "/r/m/deep/b.tar.gz", "/r/z.tar.gz"]);
}

#[test]
fn test_walk_skips_empty_subdirectories() {
    let remote_root = tempfile::tempdir().unwrap();
    fs::create_dir_all(remote_root.path().join("r/empty/nested")).unwrap();
    write_file(remote_root.path(), "r/x.tar.gz", b"");

    let remote = LocalDirRemote::new(remote_root.path());
    assert_eq!(list_all_files(&remote, "/r").unwrap(), ["/r/x.tar.gz"]);
}

#[test]
fn test_listing_failure_aborts_the_whole_walk() {
    let remote_root = tempfile::tempdir().unwrap();
    write_file(remote_root.path(), "r/a.tar.gz", b"");
    write_file(remote_root.path(), "r/locked/b.tar.gz", b"");
    write_file(remote_root.path(), "r/z.tar.gz", b"");

    let remote = LocalDirRemote::new(remote_root.path()).failing_list_on("/r/locked");
    let err = list_all_files(&remote, "/r").unwrap_err();

    match err {
        Error::Enumeration { path, source } => {
            assert_eq!(path, "/r/locked");
            assert_eq!(source.kind(), std::io::ErrorKind::PermissionDenied);
        }
        other => panic!("expected enumeration error, got {other:?}"),
    }
}

#[test]
fn test_missing_root_is_an_error() {
    let remote_root = tempfile::tempdir().unwrap();
    let remote = LocalDirRemote::new(remote_root.path());

    let result = list_all_files(&remote, "/does/not/exist");
    assert!(matches!(result, Err(Error::Enumeration { .. })));
}
