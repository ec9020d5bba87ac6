//! Common error types used throughout relayforge.
//!
//! Covers ledger-level failures (duplicate or missing jobs, database errors)
//! along with I/O and input validation failures.

/// Common error type for relayforge.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A job with this id already exists in the ledger.
    #[error("Duplicate job: {0}")]
    DuplicateJob(String),

    /// No job with this id exists in the ledger.
    #[error("Job not found: {0}")]
    JobNotFound(String),

    /// A database operation failed.
    #[error("Database error: {0}")]
    Database(String),

    /// An I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid input was provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    /// Create a new DuplicateJob error.
    pub fn duplicate_job<S: Into<String>>(id: S) -> Self {
        Self::DuplicateJob(id.into())
    }

    /// Create a new JobNotFound error.
    pub fn job_not_found<S: Into<String>>(id: S) -> Self {
        Self::JobNotFound(id.into())
    }

    /// Create a new Database error.
    pub fn database<S: Into<String>>(msg: S) -> Self {
        Self::Database(msg.into())
    }

    /// Create a new InvalidInput error.
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Self::InvalidInput(msg.into())
    }
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;
