use crate::record::TraceRecord;
use crate::timestamp::span;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A finished, read-only trace.
///
/// Produced by `TraceCollector::finish`, or loaded back from its serialized
/// form for offline comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Trace {
    record: TraceRecord,
}

impl From<TraceRecord> for Trace {
    fn from(record: TraceRecord) -> Trace {
        Trace { record }
    }
}

impl Trace {
    pub fn record(&self) -> &TraceRecord {
        &self.record
    }

    /// Body transfer time, from `begin_transfer` to `finish`.
    pub fn duration(&self) -> Option<Duration> {
        span(self.record.start, self.record.end)
    }

    pub fn total_bytes(&self) -> u64 {
        self.record.transfer.total_bytes
    }

    /// Average body rate in bytes per second.
    pub fn throughput(&self) -> Option<f64> {
        self.duration()
            .filter(|d| !d.is_zero())
            .map(|d| self.total_bytes() as f64 / d.as_secs_f64())
    }

    /// Fastest completed second of the transfer, in bytes.
    pub fn peak_second(&self) -> Option<u64> {
        self.record.transfer.per_second.iter().copied().max()
    }
}
