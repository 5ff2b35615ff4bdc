// Error types for the record stores and the submission flows

use thiserror::Error;

/// Errors surfaced by store adapters and the point-of-sale operations.
///
/// None of these are retried. The caller reports the failure once and
/// abandons the operation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing store could not be reached (I/O, database open, query).
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// The store's header (or a row's field count) does not match the schema.
    #[error("Schema mismatch in '{store}': expected [{}], found [{}]", .expected.join(", "), .found.join(", "))]
    SchemaMismatch {
        store: String,
        expected: Vec<String>,
        found: Vec<String>,
    },

    /// Input rejected before any store call.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// A persisted row could not be decoded into a record.
    #[error("Invalid row {row} in '{store}': {reason}")]
    InvalidRow {
        store: String,
        row: usize,
        reason: String,
    },

    /// Append/read against a store that was never bootstrapped.
    #[error("Unknown store: {0}")]
    UnknownStore(String),
}

impl StoreError {
    pub fn validation(message: impl Into<String>) -> Self {
        StoreError::Validation(message.into())
    }

    pub fn schema_mismatch(store: &str, expected: &[&str], found: &[String]) -> Self {
        StoreError::SchemaMismatch {
            store: store.to_string(),
            expected: expected.iter().map(|s| s.to_string()).collect(),
            found: found.to_vec(),
        }
    }

    /// True for failures the user can fix by correcting the input.
    pub fn is_validation(&self) -> bool {
        matches!(self, StoreError::Validation(_))
    }
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        StoreError::StoreUnavailable(e.to_string())
    }
}

impl From<csv::Error> for StoreError {
    fn from(e: csv::Error) -> Self {
        StoreError::StoreUnavailable(e.to_string())
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::StoreUnavailable(e.to_string())
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
