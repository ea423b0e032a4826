use serde::Deserialize;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordError {
    #[error("line carries no JSON payload")]
    NoPayload,
    #[error("malformed record payload: {0}")]
    Malformed(String),
    #[error("record url {0:?} is not an absolute url with a host")]
    BadUrl(String),
}

/// One capture described by a shard line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveRecord {
    pub mime_detected: String,
    pub url: String,
    pub status: String,
    pub host: String,
    /// `.` followed by whatever trails the last dot of the final path segment.
    pub extension: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Payload {
    #[serde(rename = "mime-detected")]
    mime_detected: String,
    url: String,
    status: String,
}

impl ArchiveRecord {
    /// Parse a shard line of the form `<surt> <timestamp> {json}`.
    pub fn parse_line(line: &str) -> Result<Self, RecordError> {
        let start = line.find('{').ok_or(RecordError::NoPayload)?;
        let payload: Payload = serde_json::from_str(line[start..].trim_end())
            .map_err(|err| RecordError::Malformed(err.to_string()))?;

        let parsed =
            Url::parse(&payload.url).map_err(|_| RecordError::BadUrl(payload.url.clone()))?;
        let host = parsed
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| RecordError::BadUrl(payload.url.clone()))?
            .to_string();
        let extension = url_extension(&parsed);

        Ok(Self {
            mime_detected: payload.mime_detected,
            url: payload.url,
            status: payload.status,
            host,
            extension,
        })
    }

    pub fn is_ok_status(&self) -> bool {
        self.status == "200"
    }
}

fn url_extension(url: &Url) -> Option<String> {
    let last = url.path_segments()?.next_back()?;
    let (_, ext) = last.rsplit_once('.')?;
    if ext.is_empty() {
        return None;
    }
    Some(format!(".{ext}"))
}
