//! Read-only DuckDB access for the question-answering pipeline
//!
//! The [`QueryGuard`] owns a single read-only connection to the analytical
//! store, screens every generated statement before it reaches the engine and
//! materializes results into a [`ResultTable`].

use thiserror::Error;

mod guard;
mod table;

#[cfg(any(test, feature = "test-fixtures"))]
pub mod fixtures;

pub use guard::{validate, QueryGuard, BLOCKED_KEYWORDS};
pub use table::{value_ref_to_json, ResultTable};

/// Errors raised while opening or inspecting the store
#[derive(Debug, Error)]
pub enum GuardError {
    #[error("Database error: {0}")]
    Database(#[from] duckdb::Error),
}

/// Why a single statement produced no data
///
/// The display strings are the user-invisible error texts carried through the
/// pipeline; every variant is absorbed into the apology path downstream.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutionError {
    #[error("Only SELECT allowed")]
    NotSelect,

    #[error("Dangerous operation blocked")]
    DangerousOperation { keyword: &'static str },

    #[error("Only a single read-only query allowed")]
    NotSingleQuery,

    #[error("No data found")]
    NoData,

    #[error("{0}")]
    Engine(String),
}

impl ExecutionError {
    /// True when the statement was refused before reaching the engine
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            ExecutionError::NotSelect
                | ExecutionError::DangerousOperation { .. }
                | ExecutionError::NotSingleQuery
        )
    }
}

impl From<duckdb::Error> for ExecutionError {
    fn from(err: duckdb::Error) -> Self {
        ExecutionError::Engine(err.to_string())
    }
}

/// Outcome of [`QueryGuard::execute`]: the materialized rows or the reason there are none
pub type ExecutionResult = Result<ResultTable, ExecutionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(ExecutionError::NotSelect.to_string(), "Only SELECT allowed");
        assert_eq!(
            ExecutionError::DangerousOperation { keyword: "DROP" }.to_string(),
            "Dangerous operation blocked"
        );
        assert_eq!(ExecutionError::NoData.to_string(), "No data found");
        assert_eq!(
            ExecutionError::Engine("Binder Error: column missing".into()).to_string(),
            "Binder Error: column missing"
        );
    }

    #[test]
    fn test_rejection_kinds() {
        assert!(ExecutionError::NotSelect.is_rejection());
        assert!(ExecutionError::NotSingleQuery.is_rejection());
        assert!(!ExecutionError::NoData.is_rejection());
        assert!(!ExecutionError::Engine("boom".into()).is_rejection());
    }
}
