//! Outcomes delivered on the pool's result queue.

use drover_core::{GatherError, TableBatch};

/// The result of one gather: a tagged batch or the failure that replaced it.
///
/// The pool emits exactly one outcome per gather it attempts — one for each
/// connection's top-level pass and one per configured table — so a consumer
/// that knows the plan can account for every connection it submitted.
#[derive(Debug)]
pub enum GatherOutcome {
    /// A successfully gathered, fully tagged batch.
    Table(TableBatch),
    /// The gather failed. The error carries the agent host and, for real
    /// tables, the table name.
    Failed(GatherError),
}

impl GatherOutcome {
    /// `true` when this outcome reports a failure.
    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, GatherOutcome::Failed(_))
    }

    /// The batch, when the gather succeeded.
    #[must_use]
    pub fn table(&self) -> Option<&TableBatch> {
        match self {
            GatherOutcome::Table(batch) => Some(batch),
            GatherOutcome::Failed(_) => None,
        }
    }

    /// The failure, when there is one.
    #[must_use]
    pub fn error(&self) -> Option<&GatherError> {
        match self {
            GatherOutcome::Table(_) => None,
            GatherOutcome::Failed(err) => Some(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use drover_core::BuildError;

    use super::*;

    #[test]
    fn test_outcome_accessors() {
        let ok = GatherOutcome::Table(TableBatch::new("interfaces"));
        assert!(!ok.is_error());
        assert_eq!(ok.table().map(|b| b.name.as_str()), Some("interfaces"));
        assert!(ok.error().is_none());

        let failed = GatherOutcome::Failed(GatherError::top_level(
            "10.0.0.1",
            BuildError::Timeout("deadline exceeded".into()),
        ));
        assert!(failed.is_error());
        assert!(failed.table().is_none());
        assert_eq!(failed.error().map(GatherError::host), Some("10.0.0.1"));
    }
}
