// Host metric reader via sysinfo. One `read()` = one normalized sample; any probe failure aborts it.

use crate::error::{Probe, ProbeError};
use crate::models::NewSample;
use chrono::{DateTime, FixedOffset, SubsecRound, Utc};
use std::future::Future;
use std::sync::{Arc, Mutex};
use sysinfo::{Disks, Networks, System};
use tracing::instrument;

/// Source of point-in-time host samples. The collector is generic over this so
/// tests can drive it with scripted readings.
pub trait MetricReader: Send + Sync {
    fn read(&self) -> impl Future<Output = Result<NewSample, ProbeError>> + Send;
}

pub struct SysinfoRepo {
    sys: Arc<Mutex<System>>,
    disks: Arc<Mutex<Disks>>,
    networks: Arc<Mutex<Networks>>,
    offset: FixedOffset,
}

impl SysinfoRepo {
    pub fn new(offset: FixedOffset) -> Self {
        let mut sys = System::new();
        sys.refresh_cpu_all();
        sys.refresh_memory();
        Self {
            sys: Arc::new(Mutex::new(sys)),
            disks: Arc::new(Mutex::new(Disks::new_with_refreshed_list())),
            networks: Arc::new(Mutex::new(Networks::new_with_refreshed_list())),
            offset,
        }
    }

    /// Aggregate CPU usage percent over one `MINIMUM_CPU_UPDATE_INTERVAL` window.
    #[instrument(skip(self), fields(repo = "sysinfo", operation = "cpu_usage"))]
    pub async fn cpu_usage(&self) -> Result<f64, ProbeError> {
        let sys = self.sys.clone();
        blocking(Probe::Cpu, move || {
            let mut sys = sys
                .lock()
                .map_err(|e| ProbeError::new(Probe::Cpu, format!("lock poisoned: {e}")))?;
            sys.refresh_cpu_all();
            std::thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
            sys.refresh_cpu_all();
            if sys.cpus().is_empty() {
                return Err(ProbeError::new(Probe::Cpu, "no CPUs reported"));
            }
            Ok((sys.global_cpu_usage() as f64).clamp(0.0, 100.0))
        })
        .await
    }

    #[instrument(skip(self), fields(repo = "sysinfo", operation = "mem_usage"))]
    pub async fn mem_usage(&self) -> Result<f64, ProbeError> {
        let sys = self.sys.clone();
        blocking(Probe::Memory, move || {
            let mut sys = sys
                .lock()
                .map_err(|e| ProbeError::new(Probe::Memory, format!("lock poisoned: {e}")))?;
            sys.refresh_memory();
            let total = sys.total_memory();
            if total == 0 {
                return Err(ProbeError::new(Probe::Memory, "total memory reported as 0"));
            }
            let used = total.saturating_sub(sys.available_memory());
            Ok((used as f64 / total as f64) * 100.0)
        })
        .await
    }

    /// One-minute load average.
    #[instrument(skip(self), fields(repo = "sysinfo", operation = "load_average"))]
    pub async fn load_average(&self) -> Result<f64, ProbeError> {
        blocking(Probe::Load, || {
            if !sysinfo::IS_SUPPORTED_SYSTEM {
                return Err(ProbeError::new(Probe::Load, "unsupported platform"));
            }
            Ok(System::load_average().one)
        })
        .await
    }

    /// Cumulative bytes read + written since boot, summed over all disks.
    #[instrument(skip(self), fields(repo = "sysinfo", operation = "disk_io"))]
    pub async fn disk_io(&self) -> Result<f64, ProbeError> {
        let disks = self.disks.clone();
        blocking(Probe::Disk, move || {
            let mut disks = disks
                .lock()
                .map_err(|e| ProbeError::new(Probe::Disk, format!("lock poisoned: {e}")))?;
            disks.refresh(true);
            let total: u64 = disks
                .list()
                .iter()
                .map(|d| {
                    let usage = d.usage();
                    usage
                        .total_read_bytes
                        .saturating_add(usage.total_written_bytes)
                })
                .fold(0u64, u64::saturating_add);
            Ok(total as f64)
        })
        .await
    }

    /// Cumulative bytes sent + received, summed over all interfaces.
    #[instrument(skip(self), fields(repo = "sysinfo", operation = "network_io"))]
    pub async fn network_io(&self) -> Result<f64, ProbeError> {
        let networks = self.networks.clone();
        blocking(Probe::Network, move || {
            let mut networks = networks
                .lock()
                .map_err(|e| ProbeError::new(Probe::Network, format!("lock poisoned: {e}")))?;
            networks.refresh(true);
            let total: u64 = networks
                .list()
                .values()
                .map(|data| {
                    data.total_transmitted()
                        .saturating_add(data.total_received())
                })
                .fold(0u64, u64::saturating_add);
            Ok(total as f64)
        })
        .await
    }
}

impl MetricReader for SysinfoRepo {
    async fn read(&self) -> Result<NewSample, ProbeError> {
        let timestamp = normalized_now(self.offset);
        let cpu_usage = self.cpu_usage().await?;
        let mem_usage = self.mem_usage().await?;
        let load_average = self.load_average().await?;
        let disk_io = self.disk_io().await?;
        let network_io = self.network_io().await?;
        Ok(NewSample {
            timestamp,
            cpu_usage,
            mem_usage,
            load_average,
            disk_io,
            network_io,
        })
    }
}

/// Current instant in `offset`, truncated to the microsecond resolution the store keeps.
pub fn normalized_now(offset: FixedOffset) -> DateTime<FixedOffset> {
    Utc::now().with_timezone(&offset).trunc_subsecs(6)
}

async fn blocking<T, F>(probe: Probe, f: F) -> Result<T, ProbeError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, ProbeError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ProbeError::new(probe, format!("task join: {e}")))?
}
