use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use harvest_logging::{harvest_debug, harvest_error, harvest_info};
use tokio::task::JoinSet;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::worker::{process_shard, ShardContext, ShardError, ShardReport};

/// Default budget for a single shard worker.
pub const DEFAULT_WORKER_TIMEOUT: Duration = Duration::from_secs(15 * 60);

#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error("worker for {url} failed: {source}")]
    Worker {
        url: String,
        #[source]
        source: ShardError,
    },
    #[error("workers for {urls:?} did not finish within {timeout:?}")]
    TimedOut { urls: Vec<String>, timeout: Duration },
    #[error("worker for {url} panicked")]
    Panicked { url: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub shards: Vec<ShardReport>,
}

/// Run one worker per shard concurrently and wait for all of them.
///
/// Every worker shares one deadline `timeout` after launch. A worker that
/// fails or panics fails the batch once its siblings have finished; the
/// first such failure is returned. Workers still running at the deadline are
/// cancelled and aborted.
pub async fn run_batch(
    ctx: &ShardContext,
    shard_urls: &[String],
    work_dir: &Path,
    timeout: Duration,
) -> Result<BatchReport, BatchError> {
    let counts = ctx.tracker.snapshot();
    harvest_info!(
        "Starting batch of {} shards; counts {:?}, {} penalized hosts",
        shard_urls.len(),
        counts.counts,
        counts.penalized.len()
    );

    let cancel = CancellationToken::new();
    let work_dir = Arc::new(work_dir.to_path_buf());
    let mut workers = JoinSet::new();
    let mut pending = HashMap::new();

    for url in shard_urls {
        harvest_debug!("Spawning worker for {url}");
        let ctx = ctx.clone();
        let cancel = cancel.clone();
        let work_dir = work_dir.clone();
        let task_url = url.clone();
        let handle = workers.spawn(async move {
            process_shard(&ctx, &task_url, &work_dir, &cancel).await
        });
        pending.insert(handle.id(), url.clone());
    }

    let deadline = Instant::now() + timeout;
    let mut report = BatchReport::default();
    let mut failure = None;
    loop {
        let joined = match tokio::time::timeout_at(deadline, workers.join_next_with_id()).await {
            Ok(Some(joined)) => joined,
            Ok(None) => break,
            Err(_) => {
                let mut urls: Vec<String> = pending.values().cloned().collect();
                urls.sort();
                let timed_out = BatchError::TimedOut { urls, timeout };
                harvest_error!("{timed_out}");
                cancel.cancel();
                workers.shutdown().await;
                failure.get_or_insert(timed_out);
                break;
            }
        };

        let err = match joined {
            Ok((id, Ok(shard))) => {
                pending.remove(&id);
                harvest_debug!("Worker for {} stopped: {:?}", shard.url, shard.outcome);
                report.shards.push(shard);
                continue;
            }
            Ok((id, Err(source))) => {
                let url = pending.remove(&id).unwrap_or_default();
                BatchError::Worker { url, source }
            }
            Err(err) => {
                let url = pending.remove(&err.id()).unwrap_or_default();
                BatchError::Panicked { url }
            }
        };
        harvest_error!("{err}");
        failure.get_or_insert(err);
    }

    match failure {
        None => Ok(report),
        Some(err) => {
            harvest_error!("Batch failed: {err}");
            Err(err)
        }
    }
}
