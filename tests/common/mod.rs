// Shared test helpers
#![allow(dead_code)]

use chrono::{DateTime, FixedOffset};
use hostmon::error::{Probe, ProbeError};
use hostmon::models::NewSample;
use hostmon::sample_repo::SampleRepo;
use hostmon::sysinfo_repo::MetricReader;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tempfile::TempDir;

pub fn utc8() -> FixedOffset {
    FixedOffset::east_opt(8 * 3600).unwrap()
}

pub fn at(s: &str) -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339(s).unwrap()
}

pub fn sample_at(timestamp: DateTime<FixedOffset>) -> NewSample {
    NewSample {
        timestamp,
        cpu_usage: 12.5,
        mem_usage: 48.25,
        load_average: 0.73,
        disk_io: 1_234_567_890.0,
        network_io: 987_654_321.0,
    }
}

/// Fresh repo in a temp dir. Keep the `TempDir` alive for the duration of the test.
pub async fn temp_repo(offset: FixedOffset) -> (TempDir, Arc<SampleRepo>) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("hostmon.db");
    let repo = SampleRepo::connect(path.to_str().unwrap(), offset, Duration::from_secs(5))
        .await
        .unwrap();
    repo.init().await.unwrap();
    (dir, Arc::new(repo))
}

/// Reader that stamps "now" and fails every `fail_every`-th call (1-based); 0 never fails.
pub struct ScriptedReader {
    pub offset: FixedOffset,
    pub fail_every: u64,
    pub calls: AtomicU64,
}

impl ScriptedReader {
    pub fn new(offset: FixedOffset, fail_every: u64) -> Self {
        Self {
            offset,
            fail_every,
            calls: AtomicU64::new(0),
        }
    }
}

impl MetricReader for ScriptedReader {
    async fn read(&self) -> Result<NewSample, ProbeError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_every > 0 && n % self.fail_every == 0 {
            return Err(ProbeError::new(Probe::Disk, format!("scripted failure #{n}")));
        }
        let mut s = sample_at(hostmon::sysinfo_repo::normalized_now(self.offset));
        s.cpu_usage = n as f64;
        Ok(s)
    }
}
