use harvest_logging::{harvest_info, harvest_warn};
use harvester_core::{SaveVerdict, Tally, TallySnapshot};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("tracker task is no longer running")]
pub struct TrackerError;

#[derive(Debug)]
enum TrackerCommand {
    Saved {
        category: String,
        digest: String,
        reply: oneshot::Sender<SaveVerdict>,
    },
    Failed {
        host: String,
        reply: oneshot::Sender<u32>,
    },
}

/// Handle to the task that owns the harvest's [`Tally`].
///
/// Workers report outcomes through the handle; the task applies them one at a
/// time and republishes a [`TallySnapshot`] before acknowledging, so a worker
/// that awaited a report always reads a snapshot that includes it.
#[derive(Debug, Clone)]
pub struct Tracker {
    cmd_tx: mpsc::UnboundedSender<TrackerCommand>,
    snapshot_rx: watch::Receiver<TallySnapshot>,
    quota_met: CancellationToken,
}

impl Tracker {
    /// Spawn the owning task. The join handle yields the final tally once
    /// every handle has been dropped.
    pub fn spawn(tally: Tally) -> (Self, JoinHandle<Tally>) {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(tally.snapshot());
        let quota_met = CancellationToken::new();
        if tally.is_complete() {
            quota_met.cancel();
        }

        let handle = tokio::spawn(run(tally, cmd_rx, snapshot_tx, quota_met.clone()));
        (
            Self {
                cmd_tx,
                snapshot_rx,
                quota_met,
            },
            handle,
        )
    }

    pub async fn record_saved(
        &self,
        category: &str,
        digest: &str,
    ) -> Result<SaveVerdict, TrackerError> {
        let (reply, rx) = oneshot::channel();
        self.cmd_tx
            .send(TrackerCommand::Saved {
                category: category.to_string(),
                digest: digest.to_string(),
                reply,
            })
            .map_err(|_| TrackerError)?;
        rx.await.map_err(|_| TrackerError)
    }

    /// Returns the host's failure count after the increment.
    pub async fn record_failure(&self, host: &str) -> Result<u32, TrackerError> {
        let (reply, rx) = oneshot::channel();
        self.cmd_tx
            .send(TrackerCommand::Failed {
                host: host.to_string(),
                reply,
            })
            .map_err(|_| TrackerError)?;
        rx.await.map_err(|_| TrackerError)
    }

    pub fn snapshot(&self) -> TallySnapshot {
        self.snapshot_rx.borrow().clone()
    }

    pub fn is_open(&self, category: &str) -> bool {
        self.snapshot_rx.borrow().is_open(category)
    }

    pub fn is_penalized(&self, host: &str) -> bool {
        self.snapshot_rx.borrow().is_penalized(host)
    }

    pub fn is_complete(&self) -> bool {
        self.quota_met.is_cancelled()
    }

    /// Fired once every requested category has reached its limit.
    pub fn quota_met(&self) -> &CancellationToken {
        &self.quota_met
    }
}

async fn run(
    mut tally: Tally,
    mut cmd_rx: mpsc::UnboundedReceiver<TrackerCommand>,
    snapshot_tx: watch::Sender<TallySnapshot>,
    quota_met: CancellationToken,
) -> Tally {
    while let Some(command) = cmd_rx.recv().await {
        match command {
            TrackerCommand::Saved {
                category,
                digest,
                reply,
            } => {
                let verdict = tally.record_saved(&category, &digest);
                if verdict == SaveVerdict::Counted {
                    let count = tally.count(&category);
                    snapshot_tx.send_modify(|snapshot| {
                        if let Some(slot) = snapshot.counts.get_mut(&category) {
                            *slot = count;
                        }
                    });
                    if !quota_met.is_cancelled() && tally.is_complete() {
                        harvest_info!("All requested quotas met");
                        quota_met.cancel();
                    }
                }
                let _ = reply.send(verdict);
            }
            TrackerCommand::Failed { host, reply } => {
                let failures = tally.record_failure(&host);
                if tally.is_penalized(&host) && !snapshot_tx.borrow().is_penalized(&host) {
                    harvest_warn!(
                        "Host {host} exceeded failure tolerance after {failures} failures, skipping it"
                    );
                    snapshot_tx.send_modify(|snapshot| {
                        snapshot.penalized.insert(host.clone());
                    });
                }
                let _ = reply.send(failures);
            }
        }
    }
    tally
}
