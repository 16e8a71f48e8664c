// Host resource sample: what the reader produces and what the repo persists.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// One reading, not yet persisted (no id).
///
/// `disk_io` and `network_io` are cumulative byte totals summed over every
/// device/interface, not per-interval rates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSample {
    pub timestamp: DateTime<FixedOffset>,
    pub cpu_usage: f64,
    pub mem_usage: f64,
    pub load_average: f64,
    pub disk_io: f64,
    pub network_io: f64,
}

/// A persisted sample. `id` is assigned by storage and never changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub id: i64,
    pub timestamp: DateTime<FixedOffset>,
    pub cpu_usage: f64,
    pub mem_usage: f64,
    pub load_average: f64,
    pub disk_io: f64,
    pub network_io: f64,
}

impl Sample {
    pub fn from_new(id: i64, s: NewSample) -> Self {
        Self {
            id,
            timestamp: s.timestamp,
            cpu_usage: s.cpu_usage,
            mem_usage: s.mem_usage,
            load_average: s.load_average,
            disk_io: s.disk_io,
            network_io: s.network_io,
        }
    }
}
