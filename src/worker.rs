//! Queue workers.
//!
//! Each worker thread claims the oldest unclaimed `SUBMITTED` job from the
//! ledger and drives it through the orchestrator, sleeping while the queue
//! is empty.

use crate::pipeline::{PipelineOrchestrator, PipelineOutcome};
use anyhow::Result;
use relayforge_common::JobId;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

/// Granularity of the stop-signal check while idle.
const IDLE_TICK: Duration = Duration::from_millis(100);

pub struct JobWorkerPool {
    orchestrator: Arc<PipelineOrchestrator>,
    workers: usize,
    poll_interval: Duration,
    stop_signal: Arc<AtomicBool>,
}

impl JobWorkerPool {
    pub fn new(orchestrator: Arc<PipelineOrchestrator>, workers: usize, poll_interval: Duration) -> Self {
        Self {
            orchestrator,
            workers: workers.max(1),
            poll_interval,
            stop_signal: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Get a clone of the stop signal for external control.
    ///
    /// Workers finish their current job before exiting.
    pub fn stop_signal(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop_signal)
    }

    fn stopped(&self) -> bool {
        self.stop_signal.load(Ordering::Relaxed)
    }

    /// Run all workers until the stop signal is set.
    pub fn run(&self) -> Result<()> {
        info!(workers = self.workers, "Job workers started");

        std::thread::scope(|scope| {
            for index in 0..self.workers {
                let name = format!("worker-{}-{}", std::process::id(), index);
                scope.spawn(move || self.worker_loop(&name));
            }
        });

        info!("Job workers stopped");
        Ok(())
    }

    fn worker_loop(&self, name: &str) {
        while !self.stopped() {
            match self.run_once(name) {
                Ok(Some(_)) => continue,
                Ok(None) => {}
                Err(e) => error!(worker = name, "Worker iteration failed: {}", e),
            }
            self.idle();
        }
        debug!(worker = name, "Worker exiting");
    }

    fn idle(&self) {
        let deadline = Instant::now() + self.poll_interval;
        while !self.stopped() && Instant::now() < deadline {
            std::thread::sleep(IDLE_TICK.min(self.poll_interval));
        }
    }

    /// Claim and run at most one job as `worker`.
    ///
    /// Returns `None` when the queue is empty.
    pub fn run_once(&self, worker: &str) -> Result<Option<(JobId, PipelineOutcome)>> {
        let Some(job) = self.orchestrator.ledger().claim_next_submitted(worker)? else {
            return Ok(None);
        };

        info!(worker, job = %job.id, "Claimed job");
        let outcome = self.orchestrator.run_job_pipeline(job.id)?;
        Ok(Some((job.id, outcome)))
    }

    /// Run queued jobs on the calling thread until the queue is empty.
    pub fn drain(&self, worker: &str) -> Result<Vec<(JobId, PipelineOutcome)>> {
        let mut finished = Vec::new();
        while let Some(result) = self.run_once(worker)? {
            finished.push(result);
        }
        Ok(finished)
    }
}
