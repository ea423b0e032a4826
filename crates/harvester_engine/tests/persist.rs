use std::fs;

use harvester_engine::{ensure_output_dir, AtomicFileWriter, PersistError, COPY_BLOCK_SIZE};
use tempfile::TempDir;

#[test]
fn creates_missing_output_dir() {
    let temp = TempDir::new().unwrap();
    let new_dir = temp.path().join("out").join("jpg");
    assert!(!new_dir.exists());
    ensure_output_dir(&new_dir).unwrap();
    assert!(new_dir.is_dir());
}

#[test]
fn file_in_place_of_output_dir_is_rejected() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("not_a_dir");
    fs::write(&file_path, "x").unwrap();

    let err = ensure_output_dir(&file_path).unwrap_err();
    assert!(matches!(err, PersistError::OutputDir { .. }));
}

#[test]
fn atomic_write_replaces_existing() {
    let temp = TempDir::new().unwrap();
    let writer = AtomicFileWriter::new(temp.path().to_path_buf());

    let first = writer.write("index.paths", b"hello").unwrap();
    assert_eq!(first.file_name().unwrap(), "index.paths");
    assert_eq!(fs::read(&first).unwrap(), b"hello");

    let second = writer.write("index.paths", b"world").unwrap();
    assert_eq!(first, second);
    assert_eq!(fs::read(&second).unwrap(), b"world");
    assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 1);
}

#[test]
fn write_from_copies_across_many_blocks() {
    let temp = TempDir::new().unwrap();
    let writer = AtomicFileWriter::new(temp.path().to_path_buf());
    let data: Vec<u8> = (0..COPY_BLOCK_SIZE * 3 + 17).map(|i| (i % 251) as u8).collect();

    let (path, written) = writer.write_from("big", &mut data.as_slice()).unwrap();
    assert_eq!(written, data.len() as u64);
    assert_eq!(fs::read(path).unwrap(), data);
}

#[test]
fn no_partial_file_on_error() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("not_a_dir");
    fs::write(&file_path, "x").unwrap();

    let writer = AtomicFileWriter::new(file_path.clone());
    let result = writer.write("doc.bin", b"data");
    assert!(result.is_err());
    assert!(!file_path.with_file_name("doc.bin").exists());
}
