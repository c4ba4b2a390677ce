//! Pool sizing configuration.

use serde::{Deserialize, Serialize};

/// Sizing knobs for a [`GatherPool`](crate::pool::GatherPool).
///
/// Every knob is a bound: the pool never grows past `workers` concurrent
/// gathering tasks, and both queues push back when full instead of
/// buffering without limit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Number of worker tasks sharing the job queue. Values below one are
    /// treated as one.
    pub workers: usize,

    /// Job queue capacity. `submit` waits while the queue is full, which is
    /// the backpressure path from the pool to whoever feeds it.
    pub job_capacity: usize,

    /// Result queue capacity. A consumer that stops draining stalls every
    /// worker mid-connection once this fills.
    pub result_capacity: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            job_capacity: 32,
            result_capacity: 64,
        }
    }
}
