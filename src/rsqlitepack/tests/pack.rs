//! Black-box tests that drive the real binary against on-disk SQLite fixtures, the way the
//! reference pack's `assert_cmd`/`tempfile` dev-dependencies are used for CLI tools that touch the
//! filesystem.

use std::fs::File;
use std::io::Read;

use assert_cmd::Command;
use rusqlite::Connection;
use tempfile::tempdir;

fn make_database(path: &std::path::Path, rows: u32) {
    let conn = Connection::open(path).unwrap();
    conn.execute_batch("CREATE TABLE t (id INTEGER PRIMARY KEY, payload BLOB)")
        .unwrap();
    for i in 0..rows {
        conn.execute(
            "INSERT INTO t (payload) VALUES (?1)",
            [vec![(i % 256) as u8; 200]],
        )
        .unwrap();
    }
}

fn page_size_and_count(path: &std::path::Path) -> (u32, u64) {
    let conn = Connection::open(path).unwrap();
    let page_size: i64 = conn.query_row("PRAGMA page_size", [], |r| r.get(0)).unwrap();
    let page_count: i64 = conn.query_row("PRAGMA page_count", [], |r| r.get(0)).unwrap();
    (page_size as u32, page_count as u64)
}

#[test]
fn single_input_roundtrips_through_a_conformant_zip_reader() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("db.sqlite");
    make_database(&db_path, 50);
    let (page_size, page_count) = page_size_and_count(&db_path);

    Command::cargo_bin("rsqlitepack")
        .unwrap()
        .current_dir(dir.path())
        .arg("archive.zip")
        .arg("db.sqlite")
        .assert()
        .success();

    let archive_path = dir.path().join("archive.zip");
    let file = File::open(&archive_path).unwrap();
    let mut zip = zip::ZipArchive::new(file).unwrap();
    assert_eq!(zip.len(), 1);

    let mut entry = zip.by_index(0).unwrap();
    assert_eq!(entry.name(), "db.sqlite");
    assert_eq!(entry.size(), page_size as u64 * page_count);

    let mut restored = Vec::new();
    entry.read_to_end(&mut restored).unwrap();
    assert_eq!(restored.len() as u64, page_size as u64 * page_count);

    let mut expected = Vec::new();
    File::open(&db_path).unwrap().read_to_end(&mut expected).unwrap();
    assert_eq!(restored, expected);
}

#[test]
fn multiple_inputs_preserve_argument_order() {
    let dir = tempdir().unwrap();
    make_database(&dir.path().join("a.sqlite"), 5);
    make_database(&dir.path().join("b.sqlite"), 5);

    Command::cargo_bin("rsqlitepack")
        .unwrap()
        .current_dir(dir.path())
        .arg("archive.zip")
        .arg("a.sqlite")
        .arg("b.sqlite")
        .assert()
        .success();

    let file = File::open(dir.path().join("archive.zip")).unwrap();
    let mut zip = zip::ZipArchive::new(file).unwrap();
    assert_eq!(zip.by_index(0).unwrap().name(), "a.sqlite");
    assert_eq!(zip.by_index(1).unwrap().name(), "b.sqlite");
}

#[test]
fn duplicate_inputs_are_rejected_and_leave_no_archive() {
    let dir = tempdir().unwrap();
    make_database(&dir.path().join("db.sqlite"), 3);

    Command::cargo_bin("rsqlitepack")
        .unwrap()
        .current_dir(dir.path())
        .arg("archive.zip")
        .arg("db.sqlite")
        .arg("db.sqlite")
        .assert()
        .failure();

    assert!(!dir.path().join("archive.zip").exists());
}

#[test]
fn missing_input_leaves_no_partial_archive() {
    let dir = tempdir().unwrap();
    make_database(&dir.path().join("db.sqlite"), 3);

    Command::cargo_bin("rsqlitepack")
        .unwrap()
        .current_dir(dir.path())
        .arg("archive.zip")
        .arg("db.sqlite")
        .arg("missing.sqlite")
        .assert()
        .failure();

    assert!(!dir.path().join("archive.zip").exists());
}

#[test]
fn absolute_input_path_is_rejected() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("db.sqlite");
    make_database(&db_path, 3);

    Command::cargo_bin("rsqlitepack")
        .unwrap()
        .current_dir(dir.path())
        .arg("archive.zip")
        .arg(db_path.to_str().unwrap())
        .assert()
        .failure();
}
