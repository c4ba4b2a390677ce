//! The table builder contract.

use async_trait::async_trait;

use crate::agent::AgentConnection;
use crate::error::BuildResult;
use crate::table::{TableBatch, TableSpec};

/// Retrieves and decodes one table from one agent.
///
/// Implementations own every protocol concern: request encoding, transport,
/// deadlines, and decoding responses into [`TableBatch`] rows. The gathering
/// core drives a builder but never looks inside it.
///
/// One builder instance is shared by all workers in a pool, so it must be
/// safe to call concurrently for *different* connections. A single
/// connection value is never used by two workers at once.
#[async_trait]
pub trait TableBuilder: Send + Sync {
    /// Builds `spec` against `agent`.
    ///
    /// `walk` selects the retrieval mode. `false` is the top-level pass: the
    /// builder fetches the definition's fields as one scalar row. `true` is
    /// the table pass: the builder iterates the agent-side table index and
    /// emits one row per index entry, honoring `spec.index_as_tag`.
    ///
    /// Rows are returned untagged beyond what the builder itself decodes;
    /// tag inheritance and the `agent_host` fallback are applied by the
    /// caller.
    ///
    /// # Errors
    ///
    /// Any transport, protocol, or decode failure. A failed build emits no
    /// rows; the caller reports the error with agent and table context and
    /// never retries.
    async fn build_table(
        &self,
        agent: &dyn AgentConnection,
        spec: &TableSpec,
        walk: bool,
    ) -> BuildResult<TableBatch>;
}
