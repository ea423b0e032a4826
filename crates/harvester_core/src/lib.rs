//! Harvester core: pure domain logic for crawl-index harvesting.
//!
//! Nothing in this crate touches the network or the filesystem beyond loading
//! the type-rule file.
mod catalog;
mod config;
mod filter;
mod record;
mod rules;
mod tally;

pub use catalog::{
    parse_catalog, sanitize_index_name, shard_stem, CatalogError, CrawlIndex, Endpoints,
    DEFAULT_CATALOG_URL, DEFAULT_DATA_HOST, DEFAULT_MANIFEST_TEMPLATE, SHARD_SUFFIX,
};
pub use config::{ConfigError, HarvestConfig, DEFAULT_PARALLELISM, DEFAULT_TOLERANCE};
pub use filter::{RecordFilter, Rejection};
pub use record::{ArchiveRecord, RecordError};
pub use rules::{RulesError, TypeRule, TypeRules};
pub use tally::{SaveVerdict, Tally, TallySnapshot};
