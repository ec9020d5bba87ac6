//! Job submission and status queries.

use crate::config::Config;
use crate::pipeline::{PipelineOrchestrator, PipelineSettings};
use anyhow::Context;
use chrono::Utc;
use relayforge_av::SystemRunner;
use relayforge_common::{Error, JobId, JobStatus, Result};
use relayforge_db::pool::init_pool;
use relayforge_db::{JobSnapshot, NewJob, SqliteLedger};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info};

/// Claim marker for jobs run synchronously by [`JobService::create_new_job`].
pub const INLINE_WORKER: &str = "inline";

/// A job snapshot plus the time since its last update.
#[derive(Debug, Clone, Serialize)]
pub struct JobStatusReport {
    #[serde(flatten)]
    pub job: JobSnapshot,
    pub elapsed_seconds: f64,
}

/// Entry point for callers creating and polling jobs.
#[derive(Clone)]
pub struct JobService {
    orchestrator: Arc<PipelineOrchestrator>,
}

impl JobService {
    pub fn new(orchestrator: Arc<PipelineOrchestrator>) -> Self {
        Self { orchestrator }
    }

    /// Wire the SQLite ledger and real tools from config.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        if let Some(parent) = config.paths.database.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create database directory {:?}", parent))?;
            }
        }
        let db_path = config.paths.database.to_string_lossy();
        info!("Opening job ledger at {}", db_path);
        let pool = init_pool(&db_path)?;

        let orchestrator = PipelineOrchestrator::new(
            Arc::new(SqliteLedger::new(pool)),
            Arc::new(SystemRunner),
            PipelineSettings::from_config(config),
        );
        Ok(Self::new(Arc::new(orchestrator)))
    }

    pub fn orchestrator(&self) -> &Arc<PipelineOrchestrator> {
        &self.orchestrator
    }

    /// Validate and record a job, returning its id without running it.
    ///
    /// A queue worker picks the job up later.
    pub fn submit_job(&self, source_path: &str, conversion_spec: &str) -> Result<JobId> {
        self.create(source_path, conversion_spec, None)
    }

    /// Record a job and run its whole pipeline before returning.
    ///
    /// The id is returned whatever the pipeline's outcome; callers read the
    /// result from the ledger.
    pub fn create_new_job(&self, source_path: &str, conversion_spec: &str) -> Result<JobId> {
        let job_id = self.create(source_path, conversion_spec, Some(INLINE_WORKER))?;

        if let Err(e) = self.orchestrator.run_job_pipeline(job_id) {
            error!(job = %job_id, "Pipeline aborted: {}", e);
        }
        Ok(job_id)
    }

    fn create(&self, source_path: &str, conversion_spec: &str, claimed_by: Option<&str>) -> Result<JobId> {
        let settings = self.orchestrator.settings();

        if let Some(policy) = &settings.spec_policy {
            policy
                .validate(conversion_spec)
                .map_err(|e| Error::invalid_input(e.to_string()))?;
        }

        let job_id = JobId::new();
        let output_path =
            settings
                .layout
                .output_path_for(job_id, source_path, &settings.output_extension)?;
        let output_path = output_path.to_string_lossy();

        let mut new_job = NewJob::new(job_id, source_path, &output_path, conversion_spec);
        if let Some(worker) = claimed_by {
            new_job = new_job.claimed_by(worker);
        }
        self.orchestrator.ledger().create(&new_job)?;

        info!(job = %job_id, source = source_path, "Job created");
        Ok(job_id)
    }

    /// Current state of a job. Unknown or malformed ids are `Ok(None)`.
    pub fn get_job_status(&self, job_id: &str) -> Result<Option<JobStatusReport>> {
        let Ok(id) = job_id.trim().parse::<JobId>() else {
            return Ok(None);
        };

        Ok(self.orchestrator.ledger().get(id)?.map(|job| JobStatusReport {
            elapsed_seconds: job.elapsed_seconds(Utc::now()),
            job,
        }))
    }

    /// Jobs newest first, optionally filtered by status.
    pub fn list_jobs(&self, status: Option<JobStatus>, limit: usize) -> Result<Vec<JobSnapshot>> {
        self.orchestrator.ledger().list(status, limit)
    }
}
