//! Job ledger operations.

use chrono::{SecondsFormat, Utc};
use relayforge_common::{Error, JobId, JobStatus, Result};
use rusqlite::{Connection, ErrorCode};

use crate::models::{JobSnapshot, NewJob};

const COLS: &str = "job_id, status, input_file, output_file, conversion_spec,
    progress_percent, last_updated, notes, created_at, claimed_by";

/// Fixed-width UTC timestamp, so text ordering matches time ordering.
fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Insert a new job in `SUBMITTED` state with zero progress.
///
/// Fails with [`Error::DuplicateJob`] if the id is already in the ledger.
pub fn create_job(conn: &Connection, job: &NewJob<'_>) -> Result<JobSnapshot> {
    let now = now_timestamp();
    let claimed_at = job.claimed_by.map(|_| now.as_str());

    let q = format!(
        "INSERT INTO conversion_jobs (job_id, status, input_file, output_file, conversion_spec,
             progress_percent, last_updated, created_at, claimed_by, claimed_at)
         VALUES (?1, ?2, ?3, ?4, ?5, 0.0, ?6, ?6, ?7, ?8)
         RETURNING {COLS}"
    );

    conn.query_row(
        &q,
        rusqlite::params![
            job.id.to_string(),
            JobStatus::Submitted.as_str(),
            job.source_path,
            job.output_path,
            job.conversion_spec,
            &now,
            job.claimed_by,
            claimed_at,
        ],
        JobSnapshot::from_row,
    )
    .map_err(|e| match e {
        rusqlite::Error::SqliteFailure(err, _) if err.code == ErrorCode::ConstraintViolation => {
            Error::duplicate_job(job.id.to_string())
        }
        _ => Error::database(e.to_string()),
    })
}

/// Overwrite a job's status, and optionally its progress and notes.
///
/// Omitted fields keep their stored value. `last_updated` is always
/// refreshed. Fails with [`Error::JobNotFound`] if no row matched.
pub fn update_job(
    conn: &Connection,
    id: JobId,
    status: JobStatus,
    progress_percent: Option<f64>,
    notes: Option<&str>,
) -> Result<()> {
    let n = conn
        .execute(
            "UPDATE conversion_jobs
             SET status = ?1,
                 progress_percent = COALESCE(?2, progress_percent),
                 notes = COALESCE(?3, notes),
                 last_updated = ?4
             WHERE job_id = ?5",
            rusqlite::params![
                status.as_str(),
                progress_percent,
                notes,
                now_timestamp(),
                id.to_string()
            ],
        )
        .map_err(|e| Error::database(e.to_string()))?;

    if n == 0 {
        return Err(Error::job_not_found(id.to_string()));
    }
    Ok(())
}

/// Get a job by id. A missing id is `Ok(None)`.
pub fn get_job(conn: &Connection, id: JobId) -> Result<Option<JobSnapshot>> {
    let q = format!("SELECT {COLS} FROM conversion_jobs WHERE job_id = ?1");
    match conn.query_row(&q, [id.to_string()], JobSnapshot::from_row) {
        Ok(job) => Ok(Some(job)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(Error::database(e.to_string())),
    }
}

/// List jobs newest first, optionally filtered by status.
pub fn list_jobs(
    conn: &Connection,
    status: Option<JobStatus>,
    limit: usize,
) -> Result<Vec<JobSnapshot>> {
    let q = format!(
        "SELECT {COLS} FROM conversion_jobs
         WHERE (?1 IS NULL OR status = ?1)
         ORDER BY created_at DESC, rowid DESC
         LIMIT ?2"
    );
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);

    let mut stmt = conn
        .prepare(&q)
        .map_err(|e| Error::database(e.to_string()))?;
    let rows = stmt
        .query_map(
            rusqlite::params![status.map(JobStatus::as_str), limit],
            JobSnapshot::from_row,
        )
        .map_err(|e| Error::database(e.to_string()))?;

    rows.collect::<rusqlite::Result<Vec<_>>>()
        .map_err(|e| Error::database(e.to_string()))
}

/// Atomically claim the oldest unclaimed `SUBMITTED` job for `worker`.
///
/// The status is left at `SUBMITTED`; the orchestrator advances it.
pub fn claim_next_submitted(conn: &Connection, worker: &str) -> Result<Option<JobSnapshot>> {
    let q = format!(
        "UPDATE conversion_jobs SET claimed_by = ?1, claimed_at = ?2
         WHERE job_id = (
             SELECT job_id FROM conversion_jobs
             WHERE status = ?3 AND claimed_by IS NULL
             ORDER BY created_at ASC, rowid ASC LIMIT 1
         )
         RETURNING {COLS}"
    );

    let result = conn.query_row(
        &q,
        rusqlite::params![worker, now_timestamp(), JobStatus::Submitted.as_str()],
        JobSnapshot::from_row,
    );
    match result {
        Ok(job) => Ok(Some(job)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(Error::database(e.to_string())),
    }
}
