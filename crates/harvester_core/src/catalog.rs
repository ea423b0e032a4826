use serde::Deserialize;

pub const DEFAULT_CATALOG_URL: &str = "https://index.commoncrawl.org/collinfo.json";
pub const DEFAULT_DATA_HOST: &str = "https://data.commoncrawl.org/";
pub const DEFAULT_MANIFEST_TEMPLATE: &str = "crawl-data/{id}/cc-index.paths.gz";

/// Suffix carried by every shard path in a manifest.
pub const SHARD_SUFFIX: &str = ".gz";

const ID_PLACEHOLDER: &str = "{id}";

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("malformed catalog document: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("catalog lists no crawl indexes")]
    Empty,
}

/// Where the catalog, manifests and shards are served from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub catalog_url: String,
    pub data_host: String,
    pub manifest_template: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            catalog_url: DEFAULT_CATALOG_URL.to_string(),
            data_host: DEFAULT_DATA_HOST.to_string(),
            manifest_template: DEFAULT_MANIFEST_TEMPLATE.to_string(),
        }
    }
}

impl Endpoints {
    /// Endpoints rooted at a single base url, e.g. a local mock server.
    pub fn rooted_at(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            catalog_url: format!("{base}/collinfo.json"),
            data_host: format!("{base}/"),
            manifest_template: DEFAULT_MANIFEST_TEMPLATE.to_string(),
        }
    }

    pub fn manifest_url(&self, id: &str) -> String {
        let path = self.manifest_template.replace(ID_PLACEHOLDER, id);
        self.data_url(&path)
    }

    /// Absolute shard url for a manifest line, or `None` for non-shard entries.
    pub fn shard_url(&self, manifest_line: &str) -> Option<String> {
        let path = manifest_line.trim();
        if path.is_empty() || !path.ends_with(SHARD_SUFFIX) {
            return None;
        }
        Some(self.data_url(path))
    }

    fn data_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.data_host.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

/// A crawl index and the location of its shard manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlIndex {
    pub name: String,
    pub manifest_url: String,
}

#[derive(Debug, Deserialize)]
struct CatalogEntry {
    name: String,
    id: String,
}

/// Parse the catalog document, preserving its order.
pub fn parse_catalog(json: &[u8], endpoints: &Endpoints) -> Result<Vec<CrawlIndex>, CatalogError> {
    let entries: Vec<CatalogEntry> = serde_json::from_slice(json)?;
    if entries.is_empty() {
        return Err(CatalogError::Empty);
    }
    Ok(entries
        .into_iter()
        .map(|entry| CrawlIndex {
            name: sanitize_index_name(&entry.name),
            manifest_url: endpoints.manifest_url(&entry.id),
        })
        .collect())
}

/// Filesystem-safe form of a crawl index name.
pub fn sanitize_index_name(name: &str) -> String {
    name.chars()
        .map(|c| if c == ' ' || c == '/' || c == '\\' { '_' } else { c })
        .collect()
}

/// Stem used for a shard's decompressed file, e.g. `cdx-00042` for `.../cdx-00042.gz`.
pub fn shard_stem(shard_url: &str) -> &str {
    let last = shard_url.rsplit('/').next().unwrap_or(shard_url);
    last.strip_suffix(SHARD_SUFFIX).unwrap_or(last)
}
