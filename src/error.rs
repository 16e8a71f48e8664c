// Error taxonomy: probe failures (reader), storage failures (repo), and their union per collector tick.
// Client input errors live next to the range parser in query.rs.

use std::fmt;
use std::time::Duration;

/// Which OS probe a reading came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Probe {
    Cpu,
    Memory,
    Load,
    Disk,
    Network,
}

impl fmt::Display for Probe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Probe::Cpu => "cpu",
            Probe::Memory => "memory",
            Probe::Load => "load",
            Probe::Disk => "disk",
            Probe::Network => "network",
        };
        f.write_str(name)
    }
}

#[derive(Debug, thiserror::Error)]
#[error("{probe} probe failed: {reason}")]
pub struct ProbeError {
    pub probe: Probe,
    pub reason: String,
}

impl ProbeError {
    pub fn new(probe: Probe, reason: impl Into<String>) -> Self {
        Self {
            probe,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database: {0}")]
    Database(#[from] sqlx::Error),
    #[error("store operation timed out after {0:?}")]
    Timeout(Duration),
    #[error("stored timestamp out of range: {0}us")]
    Timestamp(i64),
    #[error("preparing database directory: {0}")]
    Io(#[from] std::io::Error),
}

/// Why a collector tick was skipped.
#[derive(Debug, thiserror::Error)]
pub enum TickError {
    #[error(transparent)]
    Probe(#[from] ProbeError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl TickError {
    /// Stage label used in log fields.
    pub fn operation(&self) -> &'static str {
        match self {
            TickError::Probe(_) => "read_sample",
            TickError::Store(_) => "append_sample",
        }
    }
}
