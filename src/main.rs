use anyhow::Result;
use hostmon::*;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

/// How long shutdown waits for an in-flight collector tick before closing the store anyway.
const WORKER_SHUTDOWN_GRACE: Duration = Duration::from_secs(3);

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .init();

    let app_config = config::AppConfig::load()?;
    let offset = app_config.monitoring.reference_offset()?;

    // No store, no service: storage init failures abort before anything is spawned.
    let sample_repo = Arc::new(
        sample_repo::SampleRepo::connect(
            &app_config.database.path,
            offset,
            Duration::from_millis(app_config.database.op_timeout_ms),
        )
        .await
        .map_err(|e| anyhow::anyhow!("opening sample store {}: {}", app_config.database.path, e))?,
    );
    sample_repo.init().await?;
    tracing::info!(
        path = %app_config.database.path,
        samples = sample_repo.count().await?,
        utc_offset_minutes = app_config.monitoring.utc_offset_minutes,
        "sample store ready"
    );

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    let worker_handle = worker::spawn(
        worker::WorkerDeps {
            reader: Arc::new(sysinfo_repo::SysinfoRepo::new(offset)),
            sample_repo: sample_repo.clone(),
            stats: Arc::new(worker::WorkerStats::default()),
            shutdown_rx,
        },
        worker::WorkerConfig {
            sample_interval_ms: app_config.monitoring.sample_interval_ms,
            stats_log_interval_secs: app_config.monitoring.stats_log_interval_secs,
        },
    );

    let app = routes::app(sample_repo.clone());
    let addr = format!("{}:{}", app_config.server.host, app_config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{}", addr);

    let served = tokio::select! {
        result = axum::serve(listener, app) => result,
        _ = shutdown_signal() => {
            tracing::info!("Received shutdown signal");
            Ok(())
        }
    };

    let _ = shutdown_tx.send(());
    if tokio::time::timeout(WORKER_SHUTDOWN_GRACE, worker_handle)
        .await
        .is_err()
    {
        tracing::warn!("collector did not stop within grace period; closing store anyway");
    }
    sample_repo.close().await;
    tracing::info!("sample store closed");

    served?;
    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let mut sigterm = match tokio::signal::unix::signal(
            tokio::signal::unix::SignalKind::terminate(),
        ) {
            Ok(s) => s,
            Err(_) => {
                let _ = tokio::signal::ctrl_c().await;
                return;
            }
        };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
