//! Row model for the job ledger.

use chrono::{DateTime, Utc};
use relayforge_common::{JobId, JobStatus};
use rusqlite::types::Type;
use serde::{Deserialize, Serialize};

/// Fields supplied when a job row is created.
#[derive(Debug, Clone, Copy)]
pub struct NewJob<'a> {
    pub id: JobId,
    pub source_path: &'a str,
    pub output_path: &'a str,
    pub conversion_spec: &'a str,
    /// Pre-claims the row so queue workers never pick it up.
    pub claimed_by: Option<&'a str>,
}

impl<'a> NewJob<'a> {
    pub fn new(id: JobId, source_path: &'a str, output_path: &'a str, conversion_spec: &'a str) -> Self {
        Self {
            id,
            source_path,
            output_path,
            conversion_spec,
            claimed_by: None,
        }
    }

    /// Record `worker` as the owner from the moment the row exists.
    pub fn claimed_by(mut self, worker: &'a str) -> Self {
        self.claimed_by = Some(worker);
        self
    }
}

/// Point-in-time copy of one ledger row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSnapshot {
    pub id: JobId,
    pub status: JobStatus,
    /// Remote input path.
    pub source_path: String,
    /// Local artifact path chosen at creation.
    pub output_path: String,
    pub conversion_spec: String,
    /// Stage-local progress, 0 to 100.
    pub progress_percent: f64,
    pub last_updated: DateTime<Utc>,
    /// Latest diagnostic or status note. Overwritten on each update.
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Queue worker that claimed the job, if it went through the queue.
    pub claimed_by: Option<String>,
}

impl JobSnapshot {
    /// Build from a row selected with the ledger's column list.
    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        let status: String = row.get(1)?;
        Ok(Self {
            id: parse_job_id(row, 0)?,
            status: status
                .parse()
                .map_err(|e: String| conversion_error(1, e))?,
            source_path: row.get(2)?,
            output_path: row.get(3)?,
            conversion_spec: row.get(4)?,
            progress_percent: row.get(5)?,
            last_updated: parse_timestamp(row, 6)?,
            notes: row.get(7)?,
            created_at: parse_timestamp(row, 8)?,
            claimed_by: row.get(9)?,
        })
    }

    /// Seconds between the last update and `now`, never negative.
    #[must_use]
    pub fn elapsed_seconds(&self, now: DateTime<Utc>) -> f64 {
        let millis = (now - self.last_updated).num_milliseconds().max(0);
        millis as f64 / 1000.0
    }
}

fn conversion_error(idx: usize, msg: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, msg.into())
}

fn parse_timestamp(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let s: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn parse_job_id(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<JobId> {
    let s: String = row.get(idx)?;
    s.parse::<JobId>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn snapshot(last_updated: DateTime<Utc>) -> JobSnapshot {
        JobSnapshot {
            id: JobId::new(),
            status: JobStatus::Processing,
            source_path: "/remote/media/clip.mkv".into(),
            output_path: "/work/output/clip.mp4".into(),
            conversion_spec: "-c:v libx265".into(),
            progress_percent: 0.0,
            last_updated,
            notes: None,
            created_at: last_updated,
            claimed_by: None,
        }
    }

    #[test]
    fn test_elapsed_seconds() {
        let now = Utc::now();
        let job = snapshot(now - Duration::milliseconds(2500));
        assert!((job.elapsed_seconds(now) - 2.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_elapsed_seconds_clamps_clock_skew() {
        let now = Utc::now();
        let job = snapshot(now + Duration::seconds(10));
        assert_eq!(job.elapsed_seconds(now), 0.0);
    }

    #[test]
    fn test_snapshot_serializes_status_label() {
        let job = snapshot(Utc::now());
        let json = serde_json::to_value(&job).unwrap();
        assert_eq!(json["status"], "PROCESSING");
        assert_eq!(json["id"], job.id.to_string());
    }
}
