use std::path::PathBuf;

use crate::filename::{content_digest, content_filename};
use crate::persist::{AtomicFileWriter, PersistError};

/// A file deposited in a category directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub path: PathBuf,
    pub digest: String,
    /// False when identical content was already on disk.
    pub fresh: bool,
}

/// Content-addressed storage rooted at the harvest output directory.
///
/// Files live at `{root}/{category}/{sha256}.{category}`.
#[derive(Debug, Clone)]
pub struct ContentStore {
    root: PathBuf,
}

impl ContentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn category_dir(&self, category: &str) -> PathBuf {
        self.root.join(category)
    }

    pub fn store(&self, category: &str, bytes: &[u8]) -> Result<StoredFile, PersistError> {
        let digest = content_digest(bytes);
        let dir = self.category_dir(category);
        let path = dir.join(content_filename(&digest, category));
        if path.is_file() {
            return Ok(StoredFile {
                path,
                digest,
                fresh: false,
            });
        }

        let path = AtomicFileWriter::new(dir).write(&content_filename(&digest, category), bytes)?;
        Ok(StoredFile {
            path,
            digest,
            fresh: true,
        })
    }
}
