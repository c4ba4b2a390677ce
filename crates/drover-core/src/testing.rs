//! Test doubles for the gathering contracts.
//!
//! Used by drover's own tests and available to embedders for wiring tests:
//! a pool driven by a [`MockBuilder`] exercises queueing, tagging, and error
//! reporting without touching a socket.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use crate::agent::AgentConnection;
use crate::builder::TableBuilder;
use crate::error::{BuildError, BuildResult};
use crate::table::{TableBatch, TableRow, TableSpec, Value};

/// Minimal agent connection: a host string and nothing else.
#[derive(Debug, Clone)]
pub struct MockAgent {
    host: String,
}

impl MockAgent {
    /// Creates a connection reporting the given host identifier.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self { host: host.into() }
    }
}

impl AgentConnection for MockAgent {
    fn host(&self) -> &str {
        &self.host
    }
}

/// A recorded [`MockBuilder`] invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildCall {
    /// Host of the agent the call targeted.
    pub host: String,
    /// Name of the requested table.
    pub table: String,
    /// Retrieval mode the caller asked for.
    pub walk: bool,
}

/// Scripted [`TableBuilder`] with responses keyed by table name.
///
/// Unscripted tables build an empty batch. Scripted rows are cloned per
/// call, so gathering the same table for many agents starts from identical
/// untagged rows each time. Every invocation is recorded for ordering
/// assertions.
#[derive(Debug, Default)]
pub struct MockBuilder {
    rows: HashMap<String, Vec<TableRow>>,
    failures: HashMap<String, String>,
    host_failures: HashMap<(String, String), String>,
    delay: Option<Duration>,
    calls: Mutex<Vec<BuildCall>>,
}

impl MockBuilder {
    /// Creates a builder with no scripted responses.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts the rows returned for `table`.
    #[must_use]
    pub fn with_rows(mut self, table: impl Into<String>, rows: Vec<TableRow>) -> Self {
        self.rows.insert(table.into(), rows);
        self
    }

    /// Scripts a connection failure for `table`, for every agent.
    #[must_use]
    pub fn with_failure(mut self, table: impl Into<String>, message: impl Into<String>) -> Self {
        self.failures.insert(table.into(), message.into());
        self
    }

    /// Scripts a connection failure for `table` only when gathered from
    /// `host`. Other agents keep their scripted rows.
    #[must_use]
    pub fn with_host_failure(
        mut self,
        host: impl Into<String>,
        table: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        self.host_failures
            .insert((host.into(), table.into()), message.into());
        self
    }

    /// Adds a fixed delay before every response, for tests that need
    /// gathers to overlap.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// All invocations so far, in call order.
    #[must_use]
    pub fn calls(&self) -> Vec<BuildCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl TableBuilder for MockBuilder {
    async fn build_table(
        &self,
        agent: &dyn AgentConnection,
        spec: &TableSpec,
        walk: bool,
    ) -> BuildResult<TableBatch> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(BuildCall {
                host: agent.host().to_string(),
                table: spec.name.clone(),
                walk,
            });
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let host_key = (agent.host().to_string(), spec.name.clone());
        if let Some(message) = self.host_failures.get(&host_key) {
            return Err(BuildError::Connection(message.clone()));
        }
        if let Some(message) = self.failures.get(&spec.name) {
            return Err(BuildError::Connection(message.clone()));
        }
        let mut batch = TableBatch::new(spec.name.clone());
        batch.rows = self.rows.get(&spec.name).cloned().unwrap_or_default();
        Ok(batch)
    }
}

/// Builds a row carrying only the given tags.
#[must_use]
pub fn tagged_row(tags: &[(&str, &str)]) -> TableRow {
    value_row(tags, &[])
}

/// Builds a row from tag pairs and field values.
#[must_use]
pub fn value_row(tags: &[(&str, &str)], fields: &[(&str, Value)]) -> TableRow {
    TableRow {
        tags: tags
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect(),
        fields: fields
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_records_calls_in_order() {
        let builder = MockBuilder::new();
        let agent = MockAgent::new("10.0.0.1");
        let first = TableSpec::new("device");
        let second = TableSpec::new("interfaces");

        builder.build_table(&agent, &first, false).await.unwrap();
        builder.build_table(&agent, &second, true).await.unwrap();

        let calls = builder.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].table, "device");
        assert!(!calls[0].walk);
        assert_eq!(calls[1].table, "interfaces");
        assert!(calls[1].walk);
    }

    #[tokio::test]
    async fn test_mock_scripted_failure() {
        let builder = MockBuilder::new().with_failure("interfaces", "port closed");
        let agent = MockAgent::new("10.0.0.1");

        let err = builder
            .build_table(&agent, &TableSpec::new("interfaces"), true)
            .await
            .unwrap_err();

        assert!(matches!(err, BuildError::Connection(_)));
    }

    #[tokio::test]
    async fn test_host_scoped_failure_spares_other_agents() {
        let builder = MockBuilder::new()
            .with_rows("interfaces", vec![tagged_row(&[("ifDescr", "eth0")])])
            .with_host_failure("10.0.0.1", "interfaces", "unreachable");
        let spec = TableSpec::new("interfaces");

        let err = builder
            .build_table(&MockAgent::new("10.0.0.1"), &spec, true)
            .await
            .unwrap_err();
        assert!(matches!(err, BuildError::Connection(_)));

        let batch = builder
            .build_table(&MockAgent::new("10.0.0.2"), &spec, true)
            .await
            .unwrap();
        assert_eq!(batch.row_count(), 1);
    }

    #[tokio::test]
    async fn test_unscripted_table_builds_empty() {
        let builder = MockBuilder::new();
        let agent = MockAgent::new("10.0.0.1");

        let batch = builder
            .build_table(&agent, &TableSpec::new("routes"), true)
            .await
            .unwrap();

        assert!(batch.is_empty());
        assert_eq!(batch.name, "routes");
    }
}
