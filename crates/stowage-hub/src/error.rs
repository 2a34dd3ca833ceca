//! Error types for stowage-hub
//!
//! Per-record problems inside a batch (an item that does not fit, an id that
//! cannot be disposed, a bad CSV row) are returned as data in the response
//! types. The variants here are for whole-request failures.

use chrono::NaiveDate;
use stowage_core::ContainerId;
use thiserror::Error;

/// Result type for stowage-hub operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in stowage-hub
#[derive(Debug, Error)]
pub enum Error {
    /// A retrieval plan was computed against an older container revision
    #[error("plan for container {container_id} is stale (planned at revision {expected}, now {actual})")]
    StalePlan {
        container_id: ContainerId,
        expected: u64,
        actual: u64,
    },

    #[error("a simulation is already running")]
    SimulationInProgress,

    #[error("end date {end} is before start date {start}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    /// A request arrived without a parameter it cannot do without
    #[error("missing required parameter: {0}")]
    MissingParameter(&'static str),

    /// Undocking was requested before a return plan was made for the container
    #[error("no waste return plan for container {0}")]
    NoReturnPlan(ContainerId),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("core error: {0}")]
    Core(#[from] stowage_core::Error),

    #[error("journal error: {0}")]
    Journal(#[from] stowage_journal::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] stowage_csv::Error),
}

// Compile-time check that Error is Send + Sync for thread-safe error propagation.
// This function is never called but will fail to compile if the bound is not satisfied.
fn _assert_error_send_sync<T: Send + Sync>() {}
fn _error_is_send_sync() {
    _assert_error_send_sync::<Error>();
}
