use harvester_engine::{content_digest, ContentStore};
use pretty_assertions::assert_eq;

mod common;

#[test]
fn identical_bytes_land_in_one_file() {
    let temp = tempfile::TempDir::new().unwrap();
    let store = ContentStore::new(temp.path());

    let first = store.store("jpg", b"same bytes").unwrap();
    let second = store.store("jpg", b"same bytes").unwrap();

    assert!(first.fresh);
    assert!(!second.fresh);
    assert_eq!(first.path, second.path);
    assert_eq!(first.digest, content_digest(b"same bytes"));
    assert_eq!(
        common::files_in(&temp.path().join("jpg")),
        vec![format!("{}.jpg", first.digest)]
    );
}

#[test]
fn categories_are_stored_apart() {
    let temp = tempfile::TempDir::new().unwrap();
    let store = ContentStore::new(temp.path());

    let jpg = store.store("jpg", b"pixels").unwrap();
    let image = store.store("image", b"pixels").unwrap();

    assert_eq!(jpg.digest, image.digest);
    assert_eq!(jpg.path, temp.path().join("jpg").join(format!("{}.jpg", jpg.digest)));
    assert_eq!(
        image.path,
        temp.path().join("image").join(format!("{}.image", image.digest))
    );
    assert_eq!(std::fs::read(&image.path).unwrap(), b"pixels");
}

#[test]
fn concurrent_writers_of_same_content_agree() {
    let temp = tempfile::TempDir::new().unwrap();
    let store = ContentStore::new(temp.path());

    std::thread::scope(|scope| {
        for _ in 0..8 {
            let store = store.clone();
            scope.spawn(move || store.store("pdf", b"%PDF-1.7 shared").unwrap());
        }
    });

    let files = common::files_in(&temp.path().join("pdf"));
    assert_eq!(files.len(), 1);
    assert_eq!(
        std::fs::read(temp.path().join("pdf").join(&files[0])).unwrap(),
        b"%PDF-1.7 shared"
    );
}
