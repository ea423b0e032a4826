//! Harvester engine: network, storage and concurrency for a harvest run.
mod archive;
mod batch;
mod catalog;
mod engine;
mod fetch;
mod filename;
mod persist;
mod store;
mod tracker;
mod types;
mod worker;

pub use archive::{fetch_and_decompress, fetch_and_stage, gunzip_to_temp, ArchiveError};
pub use batch::{run_batch, BatchError, BatchReport, DEFAULT_WORKER_TIMEOUT};
pub use catalog::{resolve_catalog, ResolveError};
pub use engine::{
    EngineConfig, HarvestEngine, HarvestError, HarvestSummary, StopReason, MANIFEST_FILE_NAME,
};
pub use fetch::{FetchSettings, Fetcher, ReqwestFetcher};
pub use filename::{content_digest, content_filename};
pub use persist::{ensure_output_dir, AtomicFileWriter, PersistError, COPY_BLOCK_SIZE};
pub use store::{ContentStore, StoredFile};
pub use tracker::{Tracker, TrackerError};
pub use types::{FailureKind, FetchError, FetchMetadata, FetchOutput};
pub use worker::{
    process_shard, ShardContext, ShardError, ShardOutcome, ShardReport, ShardStats,
};
