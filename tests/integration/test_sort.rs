//! Integration tests for sorting local backups into dated directories

use crate::fixtures::{list_names, write_file};
use sftp_backup::cleanup::prune;
use sftp_backup::sort::{sort_into_date_dirs, DEFAULT_EXTENSIONS};
use sftp_backup::{Error, RetentionThreshold};

#[test]
fn test_sort_moves_timestamped_archives() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "2024-05-03_14-30_site.tar.gz", b"a");
    write_file(dir.path(), "site.tar.gz", b"b");
    write_file(dir.path(), "2024-05-04_01-00_notes.txt", b"c");

    let sorted = sort_into_date_dirs(dir.path(), DEFAULT_EXTENSIONS, false).unwrap();

    assert_eq!(sorted.len(), 1);
    let moved = dir.path().join("2024/05/03/2024-05-03_14-30_site.tar.gz");
    assert_eq!(sorted[0].to, moved);
    assert!(moved.is_file());
    assert_eq!(
        list_names(dir.path()),
        ["2024", "2024-05-04_01-00_notes.txt", "site.tar.gz"]
    );
}

#[test]
fn test_dry_run_moves_nothing() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "2024-05-03_14-30_site.tar.gz", b"a");

    let sorted = sort_into_date_dirs(dir.path(), DEFAULT_EXTENSIONS, true).unwrap();

    assert_eq!(sorted.len(), 1);
    assert_eq!(list_names(dir.path()), ["2024-05-03_14-30_site.tar.gz"]);
}

#[test]
fn test_existing_destination_is_left_alone() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "2024-05-03_14-30_site.tar.gz", b"new");
    write_file(dir.path(), "2024/05/03/2024-05-03_14-30_site.tar.gz", b"old");

    let sorted = sort_into_date_dirs(dir.path(), DEFAULT_EXTENSIONS, false).unwrap();

    assert!(sorted.is_empty());
    assert!(dir.path().join("2024-05-03_14-30_site.tar.gz").is_file());
}

#[test]
fn test_sorted_directories_are_skipped_by_prune() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "2024-05-03_14-30_site.tar.gz", b"a");
    sort_into_date_dirs(dir.path(), DEFAULT_EXTENSIONS, false).unwrap();

    let deleted = prune(dir.path(), RetentionThreshold::new(1).unwrap()).unwrap();
    assert!(deleted.is_empty());
    assert!(dir.path().join("2024").is_dir());
}

#[test]
fn test_sort_missing_directory() {
    let dir = tempfile::tempdir().unwrap();
    let result = sort_into_date_dirs(&dir.path().join("nope"), DEFAULT_EXTENSIONS, false);
    assert!(matches!(result, Err(Error::NotFound(_))));
}

#[test]
fn test_sort_rejects_a_regular_file() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_file(dir.path(), "2024-05-03_14-30_site.tar.gz", b"a");

    let result = sort_into_date_dirs(&file, DEFAULT_EXTENSIONS, false);

    match result {
        Err(Error::Filesystem { path, source }) => {
            assert_eq!(path, file);
            assert_eq!(source.kind(), std::io::ErrorKind::InvalidInput);
        }
        other => panic!("expected filesystem error, got {other:?}"),
    }
    assert!(file.is_file());
}
