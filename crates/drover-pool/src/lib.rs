//! # `drover-pool`
//!
//! Bounded worker pool for gathering telemetry tables from a fleet of remote
//! agents concurrently.
//!
//! # Architecture
//!
//! ```text
//! submit()                 workers (N tasks)              consumer
//!    │                          │
//!    ▼                          ▼
//! ┌───────────┐    shared    ┌────────┐              ┌─────────────┐
//! │ job queue  │ ──────────▶ │ worker │ ───────────▶ │ result queue │
//! │ (bounded)  │   receiver  │ 0..N   │   outcomes   │  (bounded)   │
//! └───────────┘             └────────┘              └─────────────┘
//! ```
//!
//! Each worker takes one connection at a time from the shared job queue and
//! gathers it completely: the implicit top-level pass first, then every
//! configured table in plan order, one [`GatherOutcome`] per gather pushed
//! to the result queue. Failures are outcomes, not stop conditions.
//!
//! Both queues are bounded, so a full job queue blocks submitters and a slow
//! outcome consumer stalls the workers. Closing the pool closes the job
//! queue; workers drain what is left and exit, and the result queue closes
//! when the last worker does.

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod config;
pub mod metrics;
pub mod outcome;
pub mod pool;
pub mod worker;

pub use config::PoolConfig;
pub use metrics::{MetricsSnapshot, WorkerMetrics};
pub use outcome::GatherOutcome;
pub use pool::{gather_all, GatherPlan, GatherPool, PoolClosed};
pub use worker::WorkerHandle;
