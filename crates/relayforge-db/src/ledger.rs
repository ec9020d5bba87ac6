//! The job ledger seam.
//!
//! The pipeline only ever sees [`JobLedger`]; [`SqliteLedger`] is the
//! durable implementation backed by the connection pool.

use relayforge_common::{JobId, JobStatus, Result};

use crate::pool::{get_conn, DbPool};
use crate::queries::jobs;

pub use crate::models::{JobSnapshot, NewJob};

/// Durable record of each job's lifecycle state.
///
/// Every mutation is committed before the call returns.
pub trait JobLedger: Send + Sync {
    /// Insert a `SUBMITTED` row with zero progress.
    fn create(&self, job: &NewJob<'_>) -> Result<JobSnapshot>;

    /// Overwrite status and the supplied optional fields.
    fn update(
        &self,
        id: JobId,
        status: JobStatus,
        progress_percent: Option<f64>,
        notes: Option<&str>,
    ) -> Result<()>;

    /// Point-in-time copy of a row; `Ok(None)` for an unknown id.
    fn get(&self, id: JobId) -> Result<Option<JobSnapshot>>;

    /// Rows newest first, optionally filtered by status.
    fn list(&self, status: Option<JobStatus>, limit: usize) -> Result<Vec<JobSnapshot>>;

    /// Claim the oldest unclaimed `SUBMITTED` row for `worker`.
    fn claim_next_submitted(&self, worker: &str) -> Result<Option<JobSnapshot>>;
}

/// [`JobLedger`] over an r2d2 SQLite pool.
#[derive(Clone)]
pub struct SqliteLedger {
    pool: DbPool,
}

impl SqliteLedger {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl JobLedger for SqliteLedger {
    fn create(&self, job: &NewJob<'_>) -> Result<JobSnapshot> {
        let conn = get_conn(&self.pool)?;
        jobs::create_job(&conn, job)
    }

    fn update(
        &self,
        id: JobId,
        status: JobStatus,
        progress_percent: Option<f64>,
        notes: Option<&str>,
    ) -> Result<()> {
        let conn = get_conn(&self.pool)?;
        jobs::update_job(&conn, id, status, progress_percent, notes)
    }

    fn get(&self, id: JobId) -> Result<Option<JobSnapshot>> {
        let conn = get_conn(&self.pool)?;
        jobs::get_job(&conn, id)
    }

    fn list(&self, status: Option<JobStatus>, limit: usize) -> Result<Vec<JobSnapshot>> {
        let conn = get_conn(&self.pool)?;
        jobs::list_jobs(&conn, status, limit)
    }

    fn claim_next_submitted(&self, worker: &str) -> Result<Option<JobSnapshot>> {
        let conn = get_conn(&self.pool)?;
        jobs::claim_next_submitted(&conn, worker)
    }
}
