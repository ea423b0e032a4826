use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use flate2::read::MultiGzDecoder;
use harvest_logging::harvest_debug;
use tempfile::{NamedTempFile, TempPath};

use crate::persist::{ensure_output_dir, AtomicFileWriter, PersistError};
use crate::{FetchError, Fetcher};

#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("download of {url} failed: {source}")]
    Fetch {
        url: String,
        #[source]
        source: FetchError,
    },
    #[error("could not prepare {path}: {source}")]
    Prepare {
        path: String,
        #[source]
        source: PersistError,
    },
    #[error("could not decompress {url}: {source}")]
    Decompress {
        url: String,
        #[source]
        source: PersistError,
    },
    #[error("decompression task for {url} did not complete")]
    Interrupted { url: String },
}

/// Download a gzip archive and materialize its decompressed form at
/// `{dir}/{output_name}`.
pub async fn fetch_and_decompress(
    fetcher: &dyn Fetcher,
    url: &str,
    dir: &Path,
    output_name: &str,
) -> Result<PathBuf, ArchiveError> {
    let staged = fetch_and_stage(fetcher, url, dir, output_name).await?;
    let target = dir.join(output_name);
    staged
        .persist(&target)
        .map_err(|err| ArchiveError::Decompress {
            url: url.to_string(),
            source: err.error.into(),
        })?;
    Ok(target)
}

/// Download a gzip archive and decompress it into a temp file in `dir`
/// named after `prefix`.
///
/// The compressed body only ever exists as a temp file inside `dir`. The
/// decompressed file is removed when the returned path drops, and also when
/// the caller stops awaiting before decompression finishes.
pub async fn fetch_and_stage(
    fetcher: &dyn Fetcher,
    url: &str,
    dir: &Path,
    prefix: &str,
) -> Result<TempPath, ArchiveError> {
    ensure_output_dir(dir).map_err(|source| ArchiveError::Prepare {
        path: dir.display().to_string(),
        source,
    })?;
    let compressed = NamedTempFile::new_in(dir).map_err(|err| ArchiveError::Prepare {
        path: dir.display().to_string(),
        source: err.into(),
    })?;

    let bytes = fetcher
        .download_to(url, compressed.path())
        .await
        .map_err(|source| ArchiveError::Fetch {
            url: url.to_string(),
            source,
        })?;
    harvest_debug!("Downloaded {bytes} compressed bytes from {url}");

    let dir = dir.to_path_buf();
    let prefix = prefix.to_string();
    let task = tokio::task::spawn_blocking(move || {
        let result = gunzip_to_temp(compressed.path(), &dir, &prefix);
        drop(compressed);
        result
    });

    match task.await {
        Ok(Ok(path)) => Ok(path),
        Ok(Err(source)) => Err(ArchiveError::Decompress {
            url: url.to_string(),
            source,
        }),
        Err(_) => Err(ArchiveError::Interrupted {
            url: url.to_string(),
        }),
    }
}

/// Decompress `source` block by block into a temp file in `dir`.
pub fn gunzip_to_temp(source: &Path, dir: &Path, prefix: &str) -> Result<TempPath, PersistError> {
    let file = File::open(source)?;
    let mut decoder = MultiGzDecoder::new(BufReader::new(file));
    let (staged, written) =
        AtomicFileWriter::new(dir.to_path_buf()).stage_from(prefix, &mut decoder)?;
    harvest_debug!("Decompressed {written} bytes into {}", staged.path().display());
    Ok(staged.into_temp_path())
}
