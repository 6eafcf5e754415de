use crate::api::{LocMode, MetricsProvider};
use crate::merge::merge_results;
use crate::roster::StudentRecord;
use futures::future;
use log::{debug, error};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, Receiver};

pub const NO_REPOSITORY_ERROR: &str = "No GitHub repository";

/// Batch size and inter-batch delay for one rate-limit tier.
///
/// The pacing delay is the sole rate-limiting control; the remote API allows
/// far more requests per hour with a token than without, hence the two tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchPacing {
    pub batch_size: usize,
    pub batch_delay: Duration,
}

const AUTHENTICATED: BatchPacing = BatchPacing {
    batch_size: 50,
    batch_delay: Duration::from_millis(50),
};

const ANONYMOUS: BatchPacing = BatchPacing {
    batch_size: 5,
    batch_delay: Duration::from_millis(2000),
};

impl BatchPacing {
    pub fn for_tier(authenticated: bool) -> Self {
        if authenticated {
            AUTHENTICATED
        } else {
            ANONYMOUS
        }
    }

    pub fn batch_count(&self, rows: usize) -> usize {
        (rows + self.batch_size - 1) / self.batch_size
    }
}

/// Drives the per-roster fetch pipeline: fan-out within a batch, pacing
/// between batches, a merged snapshot emitted after every batch.
pub struct BatchScheduler<PROVIDER> {
    provider: Arc<PROVIDER>,
    pacing: BatchPacing,
}

impl<PROVIDER: 'static + MetricsProvider> BatchScheduler<PROVIDER> {
    pub fn new(provider: PROVIDER, pacing: BatchPacing) -> Self {
        BatchScheduler {
            provider: Arc::new(provider),
            pacing,
        }
    }

    /// Processes the roster and returns the stream of merged snapshots.
    ///
    /// Batches are strictly sequential; rows within a batch are not. The
    /// terminal snapshot is always emitted after the last batch, even when
    /// it repeats the last per-batch emission. An empty roster produces no
    /// snapshots at all.
    pub fn process_roster(self, roster: Vec<StudentRecord>, mode: LocMode) -> Receiver<Vec<StudentRecord>> {
        let (sender, receiver) = mpsc::channel::<Vec<StudentRecord>>(1);
        tokio::spawn(async move {
            if roster.is_empty() {
                debug!("Empty roster, nothing to schedule");
                return;
            }
            //TODO back off on 429 responses using x-ratelimit-remaining instead of fixed pacing
            let batch_count = self.pacing.batch_count(roster.len());
            let mut accumulated = Vec::with_capacity(roster.len());
            for (index, batch) in roster.chunks(self.pacing.batch_size).enumerate() {
                debug!("Processing batch {}/{}", index + 1, batch_count);
                let results = future::join_all(
                    batch
                        .iter()
                        .cloned()
                        .map(|row| Self::row_metrics(self.provider.clone(), row, mode)),
                )
                .await;
                accumulated.extend(results);
                if sender.send(merge_results(&roster, &accumulated)).await.is_err() {
                    debug!("Snapshot receiver dropped, stopping after batch {}", index + 1);
                    return;
                }
                if index + 1 < batch_count {
                    tokio::time::sleep(self.pacing.batch_delay).await;
                }
            }
            // Terminal merge so a consumer that missed interim snapshots
            // still observes the complete roster.
            let _ = sender.send(merge_results(&roster, &accumulated)).await;
        });
        receiver
    }

    async fn row_metrics(provider: Arc<PROVIDER>, row: StudentRecord, mode: LocMode) -> StudentRecord {
        let reference = match row.repository_reference() {
            Some(reference) => reference.to_string(),
            None => return row.with_error(NO_REPOSITORY_ERROR),
        };
        match provider.repository_metrics(&reference, mode).await {
            Ok(bundle) => row.with_bundle(bundle),
            Err(err) => {
                error!("Failed to fetch metrics for {}: {}", row.name, err);
                row.with_error(err.to_string())
            }
        }
    }
}

/// Tests
