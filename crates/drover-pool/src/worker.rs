//! Per-worker gather task.
//!
//! Each worker loops on the shared job queue: take one connection, gather it
//! completely (top-level pass, then every table in plan order), push every
//! outcome to the result queue, repeat. The queue lock is held only across
//! the dequeue itself, so workers overlap on the gathers.
//!
//! A worker exits when the job queue is closed and drained, or when the
//! outcome consumer goes away. A builder failure is neither: it becomes a
//! [`GatherOutcome::Failed`] and the loop moves on.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{mpsc, Mutex};

use drover_core::gather::gather_table;
use drover_core::{
    AgentConnection, BuildResult, GatherError, TableBatch, TableBuilder, TableSpec,
};

use crate::metrics::WorkerMetrics;
use crate::outcome::GatherOutcome;
use crate::pool::GatherPlan;

/// The job queue's single receiver, shared by every worker in a pool.
///
/// `tokio`'s mpsc receiver is single-consumer, so workers take turns on it
/// behind a mutex. The critical section is just the dequeue; a worker never
/// holds the lock while gathering.
pub type JobReceiver = Arc<Mutex<mpsc::Receiver<Arc<dyn AgentConnection>>>>;

/// Handle returned when a worker is spawned.
pub struct WorkerHandle {
    /// Task join handle.
    pub join: tokio::task::JoinHandle<()>,
    /// Per-worker metrics (lock-free atomic reads).
    pub metrics: Arc<WorkerMetrics>,
}

/// Spawns worker `idx`, draining `jobs` and emitting to `results`.
///
/// The worker holds a clone of the result sender; the channel closes once
/// every worker has exited and dropped its clone.
#[must_use]
pub fn spawn_worker(
    idx: usize,
    builder: Arc<dyn TableBuilder>,
    plan: Arc<GatherPlan>,
    jobs: JobReceiver,
    results: mpsc::Sender<GatherOutcome>,
) -> WorkerHandle {
    let metrics = Arc::new(WorkerMetrics::default());
    let metrics_task = Arc::clone(&metrics);

    let join = tokio::spawn(async move {
        tracing::debug!(idx, "Worker started");
        let top_spec = plan.top_level_spec();

        loop {
            // Scope the lock to the dequeue; gathering runs unlocked.
            let job = { jobs.lock().await.recv().await };
            let Some(agent) = job else {
                // Job queue closed and drained.
                break;
            };

            let keep_going = gather_connection(
                builder.as_ref(),
                &plan,
                &top_spec,
                agent.as_ref(),
                &results,
                &metrics_task,
            )
            .await;
            if !keep_going {
                tracing::debug!(idx, "Consumer dropped, stopping");
                break;
            }
        }

        tracing::debug!(idx, "Worker finished");
    });

    WorkerHandle { join, metrics }
}

/// Gathers one connection end to end, emitting one outcome per gather.
///
/// Returns `false` when the result channel is closed, which tells the
/// worker loop to stop.
async fn gather_connection(
    builder: &dyn TableBuilder,
    plan: &GatherPlan,
    top_spec: &TableSpec,
    agent: &dyn AgentConnection,
    results: &mpsc::Sender<GatherOutcome>,
    metrics: &WorkerMetrics,
) -> bool {
    // Fresh tag context per connection; the top-level pass fills it.
    let mut top_tags = HashMap::new();

    let outcome = match timed_gather(builder, agent, top_spec, &mut top_tags, false, metrics).await
    {
        Ok(batch) => GatherOutcome::Table(batch),
        Err(e) => GatherOutcome::Failed(GatherError::top_level(agent.host(), e)),
    };
    if results.send(outcome).await.is_err() {
        return false;
    }

    for spec in &plan.tables {
        let outcome = match timed_gather(builder, agent, spec, &mut top_tags, true, metrics).await
        {
            Ok(batch) => GatherOutcome::Table(batch),
            Err(e) => GatherOutcome::Failed(GatherError::for_table(agent.host(), &spec.name, e)),
        };
        if results.send(outcome).await.is_err() {
            return false;
        }
    }

    true
}

/// Runs one gather, recording latency and counters.
async fn timed_gather(
    builder: &dyn TableBuilder,
    agent: &dyn AgentConnection,
    spec: &TableSpec,
    top_tags: &mut HashMap<String, String>,
    walk: bool,
    metrics: &WorkerMetrics,
) -> BuildResult<TableBatch> {
    let start = Instant::now();
    let result = gather_table(builder, agent, spec, top_tags, walk).await;
    #[allow(clippy::cast_possible_truncation)]
    let latency_ns = start.elapsed().as_nanos() as u64;
    match &result {
        Ok(batch) => {
            #[allow(clippy::cast_possible_truncation)]
            let row_count = batch.row_count() as u64;
            metrics.record_gather(row_count, latency_ns);
        }
        Err(e) => {
            metrics.record_error(latency_ns);
            tracing::warn!(agent = %agent.host(), table = %spec.name, error = %e, "Gather failed");
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use drover_core::testing::{tagged_row, MockAgent, MockBuilder};

    use super::*;

    fn interface_plan() -> Arc<GatherPlan> {
        Arc::new(GatherPlan {
            name: "device".to_string(),
            scalar_fields: Vec::new(),
            tables: vec![TableSpec::new("interfaces")],
        })
    }

    #[tokio::test]
    async fn test_worker_gathers_queued_connections() {
        let builder: Arc<MockBuilder> = Arc::new(
            MockBuilder::new().with_rows("interfaces", vec![tagged_row(&[("ifDescr", "eth0")])]),
        );
        let (job_tx, job_rx) = mpsc::channel::<Arc<dyn AgentConnection>>(8);
        let (result_tx, mut result_rx) = mpsc::channel(16);
        let jobs: JobReceiver = Arc::new(Mutex::new(job_rx));

        let handle = spawn_worker(
            0,
            Arc::clone(&builder) as Arc<dyn TableBuilder>,
            interface_plan(),
            jobs,
            result_tx,
        );

        job_tx.send(Arc::new(MockAgent::new("10.0.0.1"))).await.unwrap();
        job_tx.send(Arc::new(MockAgent::new("10.0.0.2"))).await.unwrap();
        drop(job_tx);

        let mut names = Vec::new();
        while let Some(outcome) = result_rx.recv().await {
            let batch = outcome.table().expect("no failures scripted").clone();
            names.push(batch.name);
        }
        // One worker processes connections in submission order, top-level
        // before tables within each.
        assert_eq!(names, ["device", "interfaces", "device", "interfaces"]);

        handle.join.await.unwrap();
        let snap = handle.metrics.snapshot();
        assert_eq!(snap.tables, 4);
        assert_eq!(snap.rows, 2);
        assert_eq!(snap.errors, 0);
    }

    #[tokio::test]
    async fn test_worker_reports_failure_and_continues() {
        let builder: Arc<MockBuilder> = Arc::new(
            MockBuilder::new()
                .with_failure("device", "no route to host")
                .with_rows("interfaces", vec![tagged_row(&[("ifDescr", "eth0")])]),
        );
        let plan = Arc::new(GatherPlan {
            name: "device".to_string(),
            scalar_fields: Vec::new(),
            tables: vec![TableSpec::new("interfaces"), TableSpec::new("routes")],
        });
        let (job_tx, job_rx) = mpsc::channel::<Arc<dyn AgentConnection>>(8);
        let (result_tx, mut result_rx) = mpsc::channel(16);

        let handle = spawn_worker(
            0,
            Arc::clone(&builder) as Arc<dyn TableBuilder>,
            plan,
            Arc::new(Mutex::new(job_rx)),
            result_tx,
        );

        job_tx.send(Arc::new(MockAgent::new("agentX"))).await.unwrap();
        drop(job_tx);

        let first = result_rx.recv().await.unwrap();
        let err = first.error().expect("top-level should fail");
        assert_eq!(err.host(), "agentX");
        assert_eq!(err.table(), None);

        // The failed top-level pass does not cancel the connection's tables.
        let second = result_rx.recv().await.unwrap();
        assert_eq!(second.table().unwrap().name, "interfaces");
        let third = result_rx.recv().await.unwrap();
        assert_eq!(third.table().unwrap().name, "routes");
        assert!(result_rx.recv().await.is_none());

        let calls = builder.calls();
        assert_eq!(calls.len(), 3);
        assert!(!calls[0].walk);
        assert!(calls[1].walk && calls[2].walk);

        handle.join.await.unwrap();
        let snap = handle.metrics.snapshot();
        assert_eq!(snap.errors, 1);
        assert_eq!(snap.tables, 2);
    }

    #[tokio::test]
    async fn test_worker_stops_when_consumer_dropped() {
        let builder: Arc<MockBuilder> = Arc::new(MockBuilder::new());
        let (job_tx, job_rx) = mpsc::channel::<Arc<dyn AgentConnection>>(8);
        let (result_tx, result_rx) = mpsc::channel(16);
        drop(result_rx);

        let handle = spawn_worker(
            0,
            Arc::clone(&builder) as Arc<dyn TableBuilder>,
            interface_plan(),
            Arc::new(Mutex::new(job_rx)),
            result_tx,
        );

        job_tx.send(Arc::new(MockAgent::new("10.0.0.1"))).await.unwrap();
        job_tx.send(Arc::new(MockAgent::new("10.0.0.2"))).await.unwrap();

        // Worker exits after the first failed send even though the job
        // queue is still open.
        handle.join.await.unwrap();
        assert_eq!(builder.calls().len(), 1);
    }
}
