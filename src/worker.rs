// Background collector: every tick read one sample and append it.
// A failed tick is logged and skipped; the loop only ends on shutdown.

use crate::error::TickError;
use crate::models::Sample;
use crate::sample_repo::SampleRepo;
use crate::sysinfo_repo::MetricReader;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::time::{Duration, interval};
use tracing::Instrument;

/// Running totals, shared with whoever wants to report them.
#[derive(Debug, Default)]
pub struct WorkerStats {
    pub samples_saved_total: AtomicU64,
    pub ticks_failed_total: AtomicU64,
}

/// Reader, repo, counters and shutdown for the worker.
pub struct WorkerDeps<R> {
    pub reader: Arc<R>,
    pub sample_repo: Arc<SampleRepo>,
    pub stats: Arc<WorkerStats>,
    pub shutdown_rx: tokio::sync::oneshot::Receiver<()>,
}

pub struct WorkerConfig {
    pub sample_interval_ms: u64,
    /// How often to log counters (real seconds).
    pub stats_log_interval_secs: u64,
}

/// One SAMPLE -> PERSIST cycle.
pub async fn collect_once<R: MetricReader>(
    reader: &R,
    sample_repo: &SampleRepo,
) -> Result<Sample, TickError> {
    let reading = reader.read().await?;
    let sample = sample_repo.append(reading).await?;
    Ok(sample)
}

pub fn spawn<R>(deps: WorkerDeps<R>, config: WorkerConfig) -> tokio::task::JoinHandle<()>
where
    R: MetricReader + 'static,
{
    let span = tracing::span!(
        tracing::Level::DEBUG,
        "worker",
        sample_interval_ms = config.sample_interval_ms
    );
    tokio::spawn(run(deps, config).instrument(span))
}

async fn run<R: MetricReader>(deps: WorkerDeps<R>, config: WorkerConfig) {
    let WorkerDeps {
        reader,
        sample_repo,
        stats,
        mut shutdown_rx,
    } = deps;

    let mut tick = interval(Duration::from_millis(config.sample_interval_ms));
    tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    let mut stats_log_tick = interval(Duration::from_secs(config.stats_log_interval_secs));
    stats_log_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    // Both intervals would otherwise fire immediately; wait a full period first.
    tick.reset();
    stats_log_tick.reset();

    loop {
        tokio::select! {
            _ = tick.tick() => {
                match collect_once(reader.as_ref(), &sample_repo).await {
                    Ok(sample) => {
                        stats.samples_saved_total.fetch_add(1, Ordering::Relaxed);
                        tracing::trace!(id = sample.id, timestamp = %sample.timestamp, "sample saved");
                    }
                    Err(e) => {
                        stats.ticks_failed_total.fetch_add(1, Ordering::Relaxed);
                        tracing::warn!(
                            error = %e,
                            operation = e.operation(),
                            "collector tick skipped"
                        );
                    }
                }
            }
            _ = &mut shutdown_rx => {
                tracing::debug!("Worker shutting down");
                break;
            }
            _ = stats_log_tick.tick() => {
                tracing::info!(
                    samples_saved_total = stats.samples_saved_total.load(Ordering::Relaxed),
                    ticks_failed_total = stats.ticks_failed_total.load(Ordering::Relaxed),
                    "collector stats"
                );
            }
        }
    }
}
