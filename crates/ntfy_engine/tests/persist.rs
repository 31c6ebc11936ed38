use std::fs;

use ntfy_engine::{ensure_dir, AtomicFileWriter};
use tempfile::TempDir;

#[test]
fn creates_missing_directory() {
    let temp = TempDir::new().unwrap();
    let new_dir = temp.path().join("state");
    assert!(!new_dir.exists());
    ensure_dir(&new_dir).unwrap();
    assert!(new_dir.is_dir());
}

#[test]
fn atomic_write_creates_parents_and_replaces_existing() {
    let temp = TempDir::new().unwrap();
    let target = temp.path().join("nested").join("state.ron");
    let writer = AtomicFileWriter::new(target.clone());

    writer.write(b"first").unwrap();
    assert_eq!(fs::read_to_string(&target).unwrap(), "first");

    writer.write(b"second").unwrap();
    assert_eq!(fs::read_to_string(writer.target()).unwrap(), "second");

    let leftovers = fs::read_dir(target.parent().unwrap()).unwrap().count();
    assert_eq!(leftovers, 1);
}

#[test]
fn no_partial_file_when_parent_is_a_file() {
    let temp = TempDir::new().unwrap();
    let blocker = temp.path().join("not_a_dir");
    fs::write(&blocker, "x").unwrap();

    let writer = AtomicFileWriter::new(blocker.join("state.ron"));
    assert!(writer.write(b"data").is_err());
    assert_eq!(fs::read_to_string(&blocker).unwrap(), "x");
}
