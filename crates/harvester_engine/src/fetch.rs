use std::path::Path;
use std::time::Duration;

use futures_util::StreamExt;
use harvest_logging::{harvest_debug, harvest_warn};
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use tokio::io::AsyncWriteExt;

use crate::{FailureKind, FetchError, FetchMetadata, FetchOutput};

#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub connect_timeout: Duration,
    /// Whole-request budget for record content downloads.
    pub request_timeout: Duration,
    /// Whole-request budget for manifests and shards, which run to hundreds of MiB.
    pub archive_timeout: Duration,
    pub redirect_limit: usize,
    /// Upper bound for in-memory bodies.
    pub max_bytes: u64,
    /// Pause taken after a 503 before reporting the failure.
    pub slow_down_backoff: Duration,
    pub user_agent: String,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            archive_timeout: Duration::from_secs(10 * 60),
            redirect_limit: 5,
            max_bytes: 64 * 1024 * 1024,
            slow_down_backoff: Duration::from_secs(8),
            user_agent: concat!("harvester/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    /// Download a body into memory.
    async fn fetch(&self, url: &str) -> Result<FetchOutput, FetchError>;

    /// Stream a body into `dest`, returning the number of bytes written.
    async fn download_to(&self, url: &str, dest: &Path) -> Result<u64, FetchError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    settings: FetchSettings,
    client: reqwest::Client,
}

impl ReqwestFetcher {
    pub fn new(settings: FetchSettings) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .redirect(reqwest::redirect::Policy::limited(settings.redirect_limit))
            .user_agent(settings.user_agent.clone())
            .build()
            .map_err(|err| FetchError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self { settings, client })
    }

    async fn send(&self, url: &str, timeout: Duration) -> Result<reqwest::Response, FetchError> {
        let parsed = reqwest::Url::parse(url.trim())
            .map_err(|err| FetchError::new(FailureKind::InvalidUrl, err.to_string()))?;

        let response = self
            .client
            .get(parsed)
            .timeout(timeout)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if status == StatusCode::SERVICE_UNAVAILABLE {
            harvest_debug!(
                "503 from {url}, backing off for {:?}",
                self.settings.slow_down_backoff
            );
            tokio::time::sleep(self.settings.slow_down_backoff).await;
            return Err(FetchError::new(FailureKind::SlowDown, status.to_string()));
        }
        if !status.is_success() {
            return Err(FetchError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }
        Ok(response)
    }
}

#[async_trait::async_trait]
impl Fetcher for ReqwestFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchOutput, FetchError> {
        let response = self.send(url, self.settings.request_timeout).await?;
        let max_bytes = self.settings.max_bytes;

        if let Some(content_len) = response.content_length() {
            if content_len > max_bytes {
                return Err(FetchError::new(
                    FailureKind::TooLarge {
                        max_bytes,
                        actual: Some(content_len),
                    },
                    "response too large",
                ));
            }
        }

        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = bytes.len() as u64 + chunk.len() as u64;
            if next_len > max_bytes {
                return Err(FetchError::new(
                    FailureKind::TooLarge {
                        max_bytes,
                        actual: Some(next_len),
                    },
                    "response too large",
                ));
            }
            bytes.extend_from_slice(&chunk);
        }

        let metadata = FetchMetadata {
            original_url: url.to_string(),
            final_url,
            content_type,
            byte_len: bytes.len() as u64,
        };

        Ok(FetchOutput {
            bytes: bytes.into(),
            metadata,
        })
    }

    async fn download_to(&self, url: &str, dest: &Path) -> Result<u64, FetchError> {
        let response = self.send(url, self.settings.archive_timeout).await?;

        let mut file = tokio::fs::File::create(dest)
            .await
            .map_err(|err| FetchError::new(FailureKind::Io, err.to_string()))?;
        let mut written = 0u64;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            file.write_all(&chunk)
                .await
                .map_err(|err| FetchError::new(FailureKind::Io, err.to_string()))?;
            written += chunk.len() as u64;
        }
        file.flush()
            .await
            .map_err(|err| FetchError::new(FailureKind::Io, err.to_string()))?;

        if written == 0 {
            harvest_warn!("Empty body downloaded from {url}");
        }
        Ok(written)
    }
}

fn map_reqwest_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        return FetchError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_redirect() {
        return FetchError::new(FailureKind::RedirectLimitExceeded, err.to_string());
    }
    FetchError::new(FailureKind::Network, err.to_string())
}
