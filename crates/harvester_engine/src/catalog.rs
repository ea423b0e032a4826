use harvest_logging::{harvest_error, harvest_info};
use harvester_core::{parse_catalog, CatalogError, CrawlIndex, Endpoints};

use crate::{FetchError, Fetcher};

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("catalog {url} unreachable: {source}")]
    Fetch {
        url: String,
        #[source]
        source: FetchError,
    },
    #[error("catalog {url} unusable: {source}")]
    Parse {
        url: String,
        #[source]
        source: CatalogError,
    },
}

/// Fetch the crawl-index catalog and derive each index's manifest url.
pub async fn resolve_catalog(
    fetcher: &dyn Fetcher,
    endpoints: &Endpoints,
) -> Result<Vec<CrawlIndex>, ResolveError> {
    let url = endpoints.catalog_url.as_str();
    let output = fetcher.fetch(url).await.map_err(|source| {
        harvest_error!("Failed to fetch catalog {url}: {source}");
        ResolveError::Fetch {
            url: url.to_string(),
            source,
        }
    })?;

    let indexes = parse_catalog(&output.bytes, endpoints).map_err(|source| {
        harvest_error!("Failed to parse catalog {url}: {source}");
        ResolveError::Parse {
            url: url.to_string(),
            source,
        }
    })?;
    harvest_info!("Catalog lists {} crawl indexes", indexes.len());
    Ok(indexes)
}
