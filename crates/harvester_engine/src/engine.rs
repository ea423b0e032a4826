use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use harvest_logging::{harvest_error, harvest_info, harvest_warn};
use harvester_core::{CrawlIndex, Endpoints, HarvestConfig, Tally};

use crate::archive::fetch_and_decompress;
use crate::batch::{run_batch, BatchError, DEFAULT_WORKER_TIMEOUT};
use crate::catalog::{resolve_catalog, ResolveError};
use crate::fetch::{FetchSettings, Fetcher, ReqwestFetcher};
use crate::persist::{ensure_output_dir, PersistError};
use crate::store::ContentStore;
use crate::tracker::Tracker;
use crate::worker::{ShardContext, ShardOutcome};
use crate::FetchError;

/// File name of the decompressed manifest inside an index directory.
pub const MANIFEST_FILE_NAME: &str = "index.paths";

/// Engine-level settings that do not vary between harvests.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub fetch: FetchSettings,
    pub endpoints: Endpoints,
    pub worker_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fetch: FetchSettings::default(),
            endpoints: Endpoints::default(),
            worker_timeout: DEFAULT_WORKER_TIMEOUT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    QuotaMet,
    CatalogExhausted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestSummary {
    pub stop: StopReason,
    pub counts: BTreeMap<String, u64>,
    pub penalized_hosts: usize,
    pub indexes_visited: usize,
    pub shards_processed: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum HarvestError {
    #[error("could not prepare output directory: {0}")]
    Output(#[from] PersistError),
    #[error(transparent)]
    Catalog(#[from] ResolveError),
    #[error("batch for crawl index {index} failed: {source}")]
    Batch {
        index: String,
        #[source]
        source: BatchError,
    },
}

#[derive(Default)]
struct Progress {
    indexes_visited: usize,
    shards_processed: usize,
}

/// Top-level control loop over the catalog, its manifests and their shards.
pub struct HarvestEngine {
    fetcher: Arc<dyn Fetcher>,
    config: EngineConfig,
}

impl HarvestEngine {
    pub fn new(config: EngineConfig) -> Result<Self, FetchError> {
        let fetcher = ReqwestFetcher::new(config.fetch.clone())?;
        Ok(Self::with_fetcher(Arc::new(fetcher), config))
    }

    pub fn with_fetcher(fetcher: Arc<dyn Fetcher>, config: EngineConfig) -> Self {
        Self { fetcher, config }
    }

    pub async fn run(&self, harvest: &HarvestConfig) -> Result<HarvestSummary, HarvestError> {
        ensure_output_dir(&harvest.output_dir)?;
        for category in &harvest.categories {
            ensure_output_dir(&harvest.category_dir(category))?;
        }

        let indexes = resolve_catalog(self.fetcher.as_ref(), &self.config.endpoints).await?;

        let (tracker, tally_task) = Tracker::spawn(Tally::new(
            &harvest.categories,
            harvest.limit,
            harvest.tolerance,
        ));
        let ctx = ShardContext {
            fetcher: self.fetcher.clone(),
            store: ContentStore::new(harvest.output_dir.clone()),
            filter: Arc::new(harvest.record_filter()),
            tracker,
        };

        let mut progress = Progress::default();
        let mut stop = StopReason::CatalogExhausted;
        for index in &indexes {
            progress.indexes_visited += 1;
            if self.harvest_index(harvest, &ctx, index, &mut progress).await? {
                stop = StopReason::QuotaMet;
                break;
            }
        }

        drop(ctx);
        let summary = match tally_task.await {
            Ok(tally) => {
                let snapshot = tally.snapshot();
                HarvestSummary {
                    stop,
                    counts: snapshot.counts,
                    penalized_hosts: snapshot.penalized.len(),
                    indexes_visited: progress.indexes_visited,
                    shards_processed: progress.shards_processed,
                }
            }
            Err(err) => {
                harvest_warn!("Tracker task ended abnormally: {err}");
                HarvestSummary {
                    stop,
                    counts: BTreeMap::new(),
                    penalized_hosts: 0,
                    indexes_visited: progress.indexes_visited,
                    shards_processed: progress.shards_processed,
                }
            }
        };
        harvest_info!("Harvest finished: {summary:?}");
        Ok(summary)
    }

    /// Returns `Ok(true)` once every quota is met.
    async fn harvest_index(
        &self,
        harvest: &HarvestConfig,
        ctx: &ShardContext,
        index: &CrawlIndex,
        progress: &mut Progress,
    ) -> Result<bool, HarvestError> {
        let work_dir = harvest.index_dir(&index.name);
        let Some(shard_urls) = self.load_manifest(index, &work_dir).await else {
            return Ok(false);
        };
        harvest_info!(
            "Crawl index {} lists {} shards",
            index.name,
            shard_urls.len()
        );

        let mut batch = Vec::with_capacity(harvest.parallelism);
        for url in shard_urls {
            batch.push(url);
            if batch.len() >= harvest.parallelism {
                self.drive_batch(ctx, index, &batch, &work_dir, progress).await?;
                batch.clear();
            }
            if ctx.tracker.is_complete() {
                return Ok(true);
            }
        }
        if !batch.is_empty() {
            self.drive_batch(ctx, index, &batch, &work_dir, progress).await?;
        }
        Ok(ctx.tracker.is_complete())
    }

    async fn drive_batch(
        &self,
        ctx: &ShardContext,
        index: &CrawlIndex,
        batch: &[String],
        work_dir: &Path,
        progress: &mut Progress,
    ) -> Result<(), HarvestError> {
        let report = run_batch(ctx, batch, work_dir, self.config.worker_timeout)
            .await
            .map_err(|source| HarvestError::Batch {
                index: index.name.clone(),
                source,
            })?;
        progress.shards_processed += report
            .shards
            .iter()
            .filter(|shard| shard.outcome != ShardOutcome::Cancelled)
            .count();
        Ok(())
    }

    /// Shard urls for `index`, or `None` when its manifest is unusable.
    async fn load_manifest(&self, index: &CrawlIndex, work_dir: &Path) -> Option<Vec<String>> {
        let path = match fetch_and_decompress(
            self.fetcher.as_ref(),
            &index.manifest_url,
            work_dir,
            MANIFEST_FILE_NAME,
        )
        .await
        {
            Ok(path) => path,
            Err(err) => {
                harvest_warn!("Skipping crawl index {}: {err}", index.name);
                return None;
            }
        };

        match tokio::fs::read(&path).await {
            Ok(bytes) => Some(
                String::from_utf8_lossy(&bytes)
                    .lines()
                    .filter_map(|line| self.config.endpoints.shard_url(line))
                    .collect(),
            ),
            Err(err) => {
                harvest_error!("Could not read manifest {}: {err}", path.display());
                None
            }
        }
    }
}
