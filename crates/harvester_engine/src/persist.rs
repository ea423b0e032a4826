use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use tempfile::{Builder, NamedTempFile};
use thiserror::Error;

/// Block size used when copying decompressed data to disk.
pub const COPY_BLOCK_SIZE: usize = 64 * 1024;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("output directory {path} missing or not writable: {message}")]
    OutputDir { path: String, message: String },
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Ensure output directory exists; create if missing.
pub fn ensure_output_dir(dir: &Path) -> Result<(), PersistError> {
    let fail = |message: String| PersistError::OutputDir {
        path: dir.display().to_string(),
        message,
    };
    if dir.exists() {
        let meta = fs::metadata(dir).map_err(|e| fail(e.to_string()))?;
        if !meta.is_dir() {
            return Err(fail("path is not a directory".into()));
        }
    } else {
        fs::create_dir_all(dir).map_err(|e| fail(e.to_string()))?;
    }
    // Writable if a temp file can be created.
    NamedTempFile::new_in(dir).map_err(|e| fail(e.to_string()))?;
    Ok(())
}

/// Writes `{dir}/{filename}` through a sibling temp file and a rename, so
/// readers never observe a partial file.
pub struct AtomicFileWriter {
    dir: PathBuf,
}

impl AtomicFileWriter {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn write(&self, filename: &str, content: &[u8]) -> Result<PathBuf, PersistError> {
        self.write_from(filename, &mut io::Cursor::new(content))
            .map(|(path, _)| path)
    }

    /// Copy `reader` into `{dir}/{filename}` in fixed-size blocks. Returns the
    /// final path and the number of bytes written.
    pub fn write_from(
        &self,
        filename: &str,
        reader: &mut dyn Read,
    ) -> Result<(PathBuf, u64), PersistError> {
        let target = self.dir.join(filename);
        let (tmp, written) = self.stage_from(filename, reader)?;

        // Rename replaces an existing target; concurrent writers of identical
        // bytes leave the same content behind.
        tmp.persist(&target).map_err(|e| PersistError::Io(e.error))?;
        Ok((target, written))
    }

    /// Copy `reader` into a synced temp file in `dir` whose name starts with
    /// `prefix`. The file is deleted when the returned handle drops unless
    /// the caller persists it.
    pub fn stage_from(
        &self,
        prefix: &str,
        reader: &mut dyn Read,
    ) -> Result<(NamedTempFile, u64), PersistError> {
        ensure_output_dir(&self.dir)?;

        let mut tmp = Builder::new().prefix(prefix).tempfile_in(&self.dir)?;
        let mut block = vec![0u8; COPY_BLOCK_SIZE];
        let mut written = 0u64;
        loop {
            let n = match reader.read(&mut block) {
                Ok(0) => break,
                Ok(n) => n,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err.into()),
            };
            tmp.write_all(&block[..n])?;
            written += n as u64;
        }
        tmp.flush()?;
        tmp.as_file_mut().sync_all()?;
        Ok((tmp, written))
    }
}
