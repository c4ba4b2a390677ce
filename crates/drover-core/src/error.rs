//! Error types for table building and gathering.

use thiserror::Error;

/// Convenience alias for builder results.
pub type BuildResult<T> = Result<T, BuildError>;

/// A failure raised by a [`TableBuilder`](crate::TableBuilder)
/// implementation.
///
/// The gathering core treats every variant the same way: the gather that hit
/// it produces no rows and is reported as a single failed outcome. Variants
/// exist so embedders can distinguish transport trouble from bad data when
/// inspecting outcomes.
#[derive(Debug, Error)]
pub enum BuildError {
    /// The transport could not reach the agent, or the connection dropped
    /// mid-request.
    #[error("connection failed: {0}")]
    Connection(String),

    /// The agent did not answer within the protocol layer's deadline.
    #[error("request timed out: {0}")]
    Timeout(String),

    /// The agent answered, but the response could not be decoded into rows.
    #[error("decode error: {0}")]
    Decode(String),

    /// The agent refused the request (authorization, unknown object).
    #[error("agent rejected request: {0}")]
    Rejected(String),

    /// Builder-specific failure that fits none of the above.
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// A [`BuildError`] wrapped with the context of which gather failed.
///
/// Constructed by the worker pool when a build fails; the underlying error
/// is preserved as the source so callers can still match on it.
#[derive(Debug, Error)]
pub enum GatherError {
    /// The implicit top-level gather for an agent failed. Real tables for
    /// the same connection are still attempted afterwards.
    #[error("agent {host}: {source}")]
    TopLevel {
        /// Host identifier of the agent being gathered.
        host: String,
        /// The builder failure.
        source: BuildError,
    },

    /// A real-table gather for an agent failed.
    #[error("agent {host}: gathering table {table}: {source}")]
    Table {
        /// Host identifier of the agent being gathered.
        host: String,
        /// Name of the table definition that failed.
        table: String,
        /// The builder failure.
        source: BuildError,
    },
}

impl GatherError {
    /// Wraps a top-level build failure with its agent.
    #[must_use]
    pub fn top_level(host: impl Into<String>, source: BuildError) -> Self {
        GatherError::TopLevel {
            host: host.into(),
            source,
        }
    }

    /// Wraps a real-table build failure with its agent and table.
    #[must_use]
    pub fn for_table(host: impl Into<String>, table: impl Into<String>, source: BuildError) -> Self {
        GatherError::Table {
            host: host.into(),
            table: table.into(),
            source,
        }
    }

    /// Host identifier of the agent whose gather failed.
    #[must_use]
    pub fn host(&self) -> &str {
        match self {
            GatherError::TopLevel { host, .. } | GatherError::Table { host, .. } => host,
        }
    }

    /// Table name for real-table failures, `None` for top-level ones.
    #[must_use]
    pub fn table(&self) -> Option<&str> {
        match self {
            GatherError::TopLevel { .. } => None,
            GatherError::Table { table, .. } => Some(table),
        }
    }

    /// The underlying builder failure.
    #[must_use]
    pub fn build_error(&self) -> &BuildError {
        match self {
            GatherError::TopLevel { source, .. } | GatherError::Table { source, .. } => source,
        }
    }
}
