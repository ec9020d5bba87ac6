//! Stage executor.
//!
//! Runs one external operation to completion, classifies the result, and
//! records the stage's working, complete, or failed status in the ledger.

use relayforge_av::{CommandRunner, ToolCommand, ToolOutput};
use relayforge_common::{JobId, Result, Stage};
use relayforge_db::JobLedger;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Longest diagnostic tail kept in a ledger note.
const MAX_DIAGNOSTIC_CHARS: usize = 4000;

/// How a stage ended. The ledger already reflects it when this is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageOutcome {
    Succeeded,
    Failed,
}

impl StageOutcome {
    pub fn is_success(self) -> bool {
        self == Self::Succeeded
    }
}

/// Runs stage commands and writes their results to the ledger.
///
/// `Err` is returned only when the ledger itself cannot be written; an
/// external tool failing is a [`StageOutcome::Failed`].
pub struct StageExecutor {
    ledger: Arc<dyn JobLedger>,
    runner: Arc<dyn CommandRunner>,
}

impl StageExecutor {
    pub fn new(ledger: Arc<dyn JobLedger>, runner: Arc<dyn CommandRunner>) -> Self {
        Self { ledger, runner }
    }

    /// Run an rsync transfer for `stage` (transfer-in or transfer-out).
    ///
    /// Succeeds on exit code 0.
    pub fn run_transfer(&self, job_id: JobId, stage: Stage, cmd: &ToolCommand) -> Result<StageOutcome> {
        self.start(job_id, stage, &format!("Starting {} transfer.", stage))?;

        match self.invoke(job_id, stage, cmd) {
            Ok(output) if output.success() => {
                self.succeed(job_id, stage, &format!("{} successful.", stage))
            }
            Ok(output) => self.fail(
                job_id,
                stage,
                &format!(
                    "RSYNC {} FAILED. Command: {}. Exit code: {}. Error: {}",
                    stage,
                    cmd.display(),
                    output.exit_label(),
                    diagnostic(&output.stderr)
                ),
            ),
            Err(e) => self.fail(
                job_id,
                stage,
                &format!("RSYNC {} FAILED. Command: {}. Error: {}", stage, cmd.display(), e),
            ),
        }
    }

    /// Run the same-host backup copy over ssh.
    ///
    /// Succeeds only on exit code 0 with nothing written to stderr.
    pub fn run_remote_copy(&self, job_id: JobId, cmd: &ToolCommand) -> Result<StageOutcome> {
        let stage = Stage::BackupSource;
        self.start(job_id, stage, "Starting source backup on the remote host.")?;

        match self.invoke(job_id, stage, cmd) {
            Ok(output) if output.success() && output.stderr.trim().is_empty() => {
                self.succeed(job_id, stage, "Source backup successful.")
            }
            Ok(output) => self.fail(
                job_id,
                stage,
                &format!(
                    "BACKUP FAILED. Command: {}. Exit code: {}. Error: {}",
                    cmd.display(),
                    output.exit_label(),
                    diagnostic(&output.stderr)
                ),
            ),
            Err(e) => self.fail(
                job_id,
                stage,
                &format!("BACKUP FAILED. Command: {}. Error: {}", cmd.display(), e),
            ),
        }
    }

    /// Run the transcoder.
    ///
    /// Succeeds on exit code 0 when `expected_output` exists afterwards.
    pub fn run_transcode(
        &self,
        job_id: JobId,
        cmd: &ToolCommand,
        expected_output: &Path,
    ) -> Result<StageOutcome> {
        let stage = Stage::Processing;
        self.start(job_id, stage, "Starting FFMPEG conversion.")?;

        match self.invoke(job_id, stage, cmd) {
            Ok(output) if output.success() => {
                if expected_output.exists() {
                    self.succeed(job_id, stage, "FFMPEG finished successfully.")
                } else {
                    self.fail(
                        job_id,
                        stage,
                        &format!(
                            "FFMPEG failed to create output file {}. Command: {}",
                            expected_output.display(),
                            cmd.display()
                        ),
                    )
                }
            }
            Ok(output) => self.fail(
                job_id,
                stage,
                &format!(
                    "FFMPEG EXECUTION FAILED. Command: {}. Exited with code {}. STDERR: {}",
                    cmd.display(),
                    output.exit_label(),
                    diagnostic(&output.stderr)
                ),
            ),
            Err(e) => self.fail(
                job_id,
                stage,
                &format!("FFMPEG EXECUTION FAILED. Command: {}. Error: {}", cmd.display(), e),
            ),
        }
    }

    /// Record `stage` as started and failed without running anything, for
    /// local setup errors that stop a stage before its command.
    pub fn abort(&self, job_id: JobId, stage: Stage, note: &str) -> Result<StageOutcome> {
        self.start(job_id, stage, note)?;
        self.fail(job_id, stage, note)
    }

    fn invoke(&self, job_id: JobId, stage: Stage, cmd: &ToolCommand) -> relayforge_av::Result<ToolOutput> {
        debug!(job = %job_id, stage = %stage, command = %cmd.display(), "Invoking stage command");
        self.runner.run(cmd)
    }

    fn start(&self, job_id: JobId, stage: Stage, note: &str) -> Result<()> {
        info!(job = %job_id, stage = %stage, "Stage started");
        self.ledger.update(job_id, stage.running(), Some(0.0), Some(note))
    }

    fn succeed(&self, job_id: JobId, stage: Stage, note: &str) -> Result<StageOutcome> {
        info!(job = %job_id, stage = %stage, "Stage complete");
        self.ledger
            .update(job_id, stage.complete(), Some(100.0), Some(note))?;
        Ok(StageOutcome::Succeeded)
    }

    fn fail(&self, job_id: JobId, stage: Stage, note: &str) -> Result<StageOutcome> {
        warn!(job = %job_id, stage = %stage, "Stage failed: {}", note);
        self.ledger.update(job_id, stage.failed(), None, Some(note))?;
        Ok(StageOutcome::Failed)
    }
}

/// Trimmed stderr, keeping the tail where tools print the actual error.
fn diagnostic(stderr: &str) -> String {
    let trimmed = stderr.trim();
    let count = trimmed.chars().count();
    if count <= MAX_DIAGNOSTIC_CHARS {
        return trimmed.to_string();
    }
    let tail: String = trimmed.chars().skip(count - MAX_DIAGNOSTIC_CHARS).collect();
    format!("...{}", tail)
}
