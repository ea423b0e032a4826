use std::future::Future;
use std::io;
use std::path::Path;
use std::sync::Arc;

use harvest_logging::{harvest_debug, harvest_info, harvest_warn};
use harvester_core::{shard_stem, ArchiveRecord, RecordFilter, Rejection, SaveVerdict};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;

use crate::archive::{fetch_and_stage, ArchiveError};
use crate::store::ContentStore;
use crate::tracker::{Tracker, TrackerError};
use crate::Fetcher;

/// How a worker that did not fail came to a stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShardOutcome {
    /// Every requested category reached its limit.
    QuotaMet,
    /// The shard ran out of lines.
    Exhausted,
    /// The batch asked the worker to stop.
    Cancelled,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShardStats {
    pub lines: u64,
    pub malformed: u64,
    pub bad_status: u64,
    pub penalized_host: u64,
    pub saved: u64,
    pub duplicates: u64,
    /// Stored after the category was already full; removed again.
    pub surplus: u64,
    pub failed: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShardReport {
    pub url: String,
    pub outcome: ShardOutcome,
    pub stats: ShardStats,
}

#[derive(Debug, thiserror::Error)]
pub enum ShardError {
    #[error(transparent)]
    Archive(#[from] ArchiveError),
    #[error("could not read decompressed shard {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Tracker(#[from] TrackerError),
}

/// Everything a worker shares with its siblings for the length of a harvest.
#[derive(Clone)]
pub struct ShardContext {
    pub fetcher: Arc<dyn Fetcher>,
    pub store: ContentStore,
    pub filter: Arc<RecordFilter>,
    pub tracker: Tracker,
}

enum Step {
    Continue,
    Stop(ShardOutcome),
}

/// Harvest one shard: download it into `work_dir`, then walk its records in
/// file order until the shard ends or every quota is met.
pub async fn process_shard(
    ctx: &ShardContext,
    shard_url: &str,
    work_dir: &Path,
    cancel: &CancellationToken,
) -> Result<ShardReport, ShardError> {
    let mut stats = ShardStats::default();
    let report = |outcome, stats| ShardReport {
        url: shard_url.to_string(),
        outcome,
        stats,
    };

    if ctx.tracker.is_complete() {
        return Ok(report(ShardOutcome::QuotaMet, stats));
    }

    let download = fetch_and_stage(
        ctx.fetcher.as_ref(),
        shard_url,
        work_dir,
        shard_stem(shard_url),
    );
    // Dropping the staged path removes the decompressed shard, on every exit.
    let shard_file = match stop_aware(ctx, cancel, download).await {
        Ok(result) => result?,
        Err(outcome) => return Ok(report(outcome, stats)),
    };
    harvest_debug!("Scanning {}", shard_file.display());

    let read_err = |source| ShardError::Read {
        path: shard_file.display().to_string(),
        source,
    };
    let file = tokio::fs::File::open(&shard_file).await.map_err(read_err)?;
    let mut reader = BufReader::new(file);
    let mut buf = Vec::new();

    loop {
        if cancel.is_cancelled() {
            return Ok(report(ShardOutcome::Cancelled, stats));
        }

        buf.clear();
        if reader.read_until(b'\n', &mut buf).await.map_err(read_err)? == 0 {
            break;
        }
        stats.lines += 1;
        let line = String::from_utf8_lossy(&buf);

        if let Step::Stop(outcome) = process_line(ctx, &line, cancel, &mut stats).await? {
            return Ok(report(outcome, stats));
        }

        if ctx.tracker.is_complete() {
            harvest_info!("Quotas met while scanning {shard_url}");
            return Ok(report(ShardOutcome::QuotaMet, stats));
        }
    }

    harvest_debug!("Finished {shard_url}: {stats:?}");
    Ok(report(ShardOutcome::Exhausted, stats))
}

async fn process_line(
    ctx: &ShardContext,
    line: &str,
    cancel: &CancellationToken,
    stats: &mut ShardStats,
) -> Result<Step, ShardError> {
    let record = match ArchiveRecord::parse_line(line) {
        Ok(record) => record,
        Err(err) => {
            harvest_debug!("Skipping shard line: {err}");
            stats.malformed += 1;
            return Ok(Step::Continue);
        }
    };

    let tracker = &ctx.tracker;
    let categories = match ctx.filter.select(
        &record,
        |host| tracker.is_penalized(host),
        |category| tracker.is_open(category),
    ) {
        Ok(categories) => categories,
        Err(Rejection::Status) => {
            stats.bad_status += 1;
            return Ok(Step::Continue);
        }
        Err(Rejection::PenalizedHost) => {
            stats.penalized_host += 1;
            return Ok(Step::Continue);
        }
    };
    if categories.is_empty() {
        return Ok(Step::Continue);
    }

    harvest_debug!("{} matches {categories:?}", record.url);
    let fetched = match stop_aware(ctx, cancel, ctx.fetcher.fetch(&record.url)).await {
        Ok(fetched) => fetched,
        Err(outcome) => return Ok(Step::Stop(outcome)),
    };
    let body = match fetched {
        Ok(output) => {
            harvest_debug!(
                "Fetched {} bytes of {:?} from {}",
                output.metadata.byte_len,
                output.metadata.content_type,
                output.metadata.final_url
            );
            output.bytes
        }
        Err(err) => {
            harvest_warn!("Failed to download {}: {err}", record.url);
            stats.failed += 1;
            tracker.record_failure(&record.host).await?;
            return Ok(Step::Continue);
        }
    };

    for category in categories {
        if !tracker.is_open(category) {
            continue;
        }
        let store = ctx.store.clone();
        let owned_category = category.to_string();
        let bytes = body.clone();
        let stored =
            tokio::task::spawn_blocking(move || store.store(&owned_category, &bytes)).await;

        match stored {
            Ok(Ok(file)) => match tracker.record_saved(category, &file.digest).await? {
                SaveVerdict::Counted => {
                    stats.saved += 1;
                    harvest_debug!("Saved {} to {}", record.url, file.path.display());
                }
                SaveVerdict::Duplicate => {
                    stats.duplicates += 1;
                    harvest_debug!("{} duplicates {}", record.url, file.path.display());
                }
                SaveVerdict::Surplus => {
                    stats.surplus += 1;
                    harvest_debug!("{category} filled up before {} was counted", record.url);
                    if file.fresh {
                        if let Err(err) = tokio::fs::remove_file(&file.path).await {
                            harvest_warn!("Could not remove {}: {err}", file.path.display());
                        }
                    }
                }
            },
            Ok(Err(err)) => {
                harvest_warn!("Failed to store {} under {category}: {err}", record.url);
                stats.failed += 1;
                tracker.record_failure(&record.host).await?;
            }
            Err(err) => {
                harvest_warn!("Store task for {} did not complete: {err}", record.url);
                stats.failed += 1;
                tracker.record_failure(&record.host).await?;
            }
        }
    }
    Ok(Step::Continue)
}

/// Drive `fut` unless the batch is cancelled or the quotas are met first.
async fn stop_aware<F: Future>(
    ctx: &ShardContext,
    cancel: &CancellationToken,
    fut: F,
) -> Result<F::Output, ShardOutcome> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(ShardOutcome::Cancelled),
        _ = ctx.tracker.quota_met().cancelled() => Err(ShardOutcome::QuotaMet),
        output = fut => Ok(output),
    }
}
