//! Pool coordinator: spawn workers, feed connections, collect outcomes.
//!
//! Fan-out/fan-in over two bounded queues:
//!
//! - **Fan-out**: `submit` pushes connections onto one job queue whose single
//!   receiver is shared by every worker.
//! - **Fan-in**: workers push one [`GatherOutcome`] per gather onto the
//!   result queue handed out at spawn time.
//! - **Completion**: `close` drops the job sender, workers drain what is
//!   queued and exit, and the result queue closes when the last worker drops
//!   its sender clone. A consumer that drains to `None` has seen every
//!   outcome the pool will ever produce.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{mpsc, Mutex};

use drover_core::{AgentConnection, Field, TableBuilder, TableSpec};

use crate::config::PoolConfig;
use crate::metrics::MetricsSnapshot;
use crate::outcome::GatherOutcome;
use crate::worker::{spawn_worker, JobReceiver, WorkerHandle};

/// What one pool gathers from every connection submitted to it.
pub struct GatherPlan {
    /// Source name. The implicit top-level batch is emitted under it.
    pub name: String,
    /// Scalar fields gathered once per connection, before any table.
    pub scalar_fields: Vec<Field>,
    /// Real tables, gathered per connection in this order.
    pub tables: Vec<TableSpec>,
}

impl GatherPlan {
    /// Creates an empty plan with the given source name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            scalar_fields: Vec::new(),
            tables: Vec::new(),
        }
    }

    /// Synthesizes the implicit top-level definition: the scalar fields as a
    /// table that inherits nothing and has no index.
    #[must_use]
    pub fn top_level_spec(&self) -> TableSpec {
        TableSpec::top_level(self.name.clone(), self.scalar_fields.clone())
    }
}

/// Error returned by [`GatherPool::submit`] once the pool no longer accepts
/// work: after [`GatherPool::close`], or after every worker has stopped.
#[derive(Debug, Error)]
#[error("gather pool is closed")]
pub struct PoolClosed;

/// A bounded pool of gather workers over one job queue and one result queue.
///
/// Spawning returns the pool and the result receiver. Lifecycle is
/// submit-close-join: submitted connections are gathered by whichever worker
/// frees up first, `close` marks the end of input, and `join` waits for the
/// workers to finish. Outcome order is only guaranteed *within* one
/// connection (its top-level batch first, then its tables in plan order);
/// outcomes of different connections interleave freely.
pub struct GatherPool {
    jobs: Option<mpsc::Sender<Arc<dyn AgentConnection>>>,
    workers: Vec<WorkerHandle>,
}

impl GatherPool {
    /// Spawns `config.workers` workers (at least one) gathering `plan` with
    /// `builder`, and returns the pool plus the result receiver.
    #[must_use]
    pub fn spawn(
        builder: Arc<dyn TableBuilder>,
        plan: GatherPlan,
        config: &PoolConfig,
    ) -> (Self, mpsc::Receiver<GatherOutcome>) {
        let (job_tx, job_rx) = mpsc::channel(config.job_capacity.max(1));
        let (result_tx, result_rx) = mpsc::channel(config.result_capacity.max(1));

        let jobs: JobReceiver = Arc::new(Mutex::new(job_rx));
        let plan = Arc::new(plan);

        let workers = (0..config.workers.max(1))
            .map(|idx| {
                spawn_worker(
                    idx,
                    Arc::clone(&builder),
                    Arc::clone(&plan),
                    Arc::clone(&jobs),
                    result_tx.clone(),
                )
            })
            .collect::<Vec<_>>();

        // Drop our copy so the result channel closes when the last worker
        // exits.
        drop(result_tx);

        tracing::debug!(workers = workers.len(), "Gather pool started");

        (
            Self {
                jobs: Some(job_tx),
                workers,
            },
            result_rx,
        )
    }

    /// Queues one connection for gathering, waiting while the job queue is
    /// full.
    ///
    /// # Errors
    ///
    /// [`PoolClosed`] if the pool was closed or every worker has stopped.
    pub async fn submit(&self, agent: Arc<dyn AgentConnection>) -> Result<(), PoolClosed> {
        match &self.jobs {
            Some(tx) => tx.send(agent).await.map_err(|_| PoolClosed),
            None => Err(PoolClosed),
        }
    }

    /// Closes the job queue. Workers finish what is queued and exit; no new
    /// submissions are accepted.
    pub fn close(&mut self) {
        self.jobs = None;
    }

    /// Closes the job queue if still open and waits for every worker to
    /// exit.
    ///
    /// The result receiver keeps yielding until the queued work is done,
    /// so a consumer should drain it concurrently or rely on a result
    /// queue large enough for the remaining outcomes.
    pub async fn join(self) {
        let GatherPool { jobs, workers } = self;
        drop(jobs);

        for (idx, handle) in workers.into_iter().enumerate() {
            if let Err(e) = handle.join.await {
                tracing::warn!(worker_idx = idx, error = %e, "Worker task join error");
            }
        }
        tracing::debug!("Gather pool stopped");
    }

    /// Number of workers in the pool.
    #[must_use]
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Metrics snapshot for one worker by index (lock-free read).
    #[must_use]
    pub fn worker_metrics(&self, idx: usize) -> Option<MetricsSnapshot> {
        self.workers.get(idx).map(|h| h.metrics.snapshot())
    }

    /// Metrics summed across all workers.
    #[must_use]
    pub fn metrics(&self) -> MetricsSnapshot {
        let mut total = MetricsSnapshot::default();
        for handle in &self.workers {
            total.merge(&handle.metrics.snapshot());
        }
        total
    }
}

/// Gathers every connection in `agents` through a fresh pool and returns
/// all outcomes in arrival order.
///
/// Submission and draining run concurrently, so the bounded queues cannot
/// deadlock whatever their capacities. The returned vector holds exactly
/// `agents.len() * (1 + plan.tables.len())` outcomes.
pub async fn gather_all(
    builder: Arc<dyn TableBuilder>,
    plan: GatherPlan,
    config: &PoolConfig,
    agents: Vec<Arc<dyn AgentConnection>>,
) -> Vec<GatherOutcome> {
    let (pool, mut results) = GatherPool::spawn(builder, plan, config);

    let feeder = tokio::spawn(async move {
        for agent in agents {
            if pool.submit(agent).await.is_err() {
                tracing::debug!("Gather pool closed while feeding");
                break;
            }
        }
        pool.join().await;
    });

    let mut outcomes = Vec::new();
    while let Some(outcome) = results.recv().await {
        outcomes.push(outcome);
    }

    if let Err(e) = feeder.await {
        tracing::warn!(error = %e, "Feeder task join error");
    }
    outcomes
}
