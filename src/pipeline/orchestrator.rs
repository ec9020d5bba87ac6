//! Pipeline orchestrator.
//!
//! Drives one job through transfer-in, backup, transcode, and transfer-out,
//! writing the ledger after every stage and stopping at the first failure.

use super::executor::{StageExecutor, StageOutcome};
use super::PipelineSettings;
use relayforge_av::{spec_tokens, CommandRunner};
use relayforge_common::paths::JobPaths;
use relayforge_common::{JobId, JobStatus, Result, Stage};
use relayforge_db::{JobLedger, JobSnapshot};
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info, warn};

/// How a pipeline run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineOutcome {
    /// No ledger row for the id; nothing was written.
    NotFound,
    /// The job was already terminal and was left untouched.
    Skipped(JobStatus),
    /// The stage that failed; the ledger holds its `_FAILED` status.
    Failed(Stage),
    /// All stages succeeded and the job is `COMPLETED`.
    Completed,
}

pub struct PipelineOrchestrator {
    ledger: Arc<dyn JobLedger>,
    executor: StageExecutor,
    settings: PipelineSettings,
}

impl PipelineOrchestrator {
    pub fn new(
        ledger: Arc<dyn JobLedger>,
        runner: Arc<dyn CommandRunner>,
        settings: PipelineSettings,
    ) -> Self {
        let executor = StageExecutor::new(Arc::clone(&ledger), runner);
        Self {
            ledger,
            executor,
            settings,
        }
    }

    pub fn ledger(&self) -> &Arc<dyn JobLedger> {
        &self.ledger
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Run every stage for `job_id`, starting at stage 1.
    ///
    /// Stage failures are recorded in the ledger and reported as
    /// [`PipelineOutcome::Failed`], as are local path and directory errors.
    /// `Err` means the ledger could not be used.
    pub fn run_job_pipeline(&self, job_id: JobId) -> Result<PipelineOutcome> {
        let job = match self.ledger.get(job_id)? {
            Some(job) => job,
            None => {
                warn!(job = %job_id, "Pipeline requested for unknown job");
                return Ok(PipelineOutcome::NotFound);
            }
        };

        if job.status.is_terminal() {
            warn!(job = %job_id, status = %job.status, "Job is already terminal, not running");
            return Ok(PipelineOutcome::Skipped(job.status));
        }
        if job.status != JobStatus::Submitted {
            info!(job = %job_id, status = %job.status, "Restarting interrupted job from the first stage");
        }

        let resolved = JobPaths::resolve(
            job.id,
            &job.source_path,
            Path::new(&job.output_path),
            &self.settings.layout,
            &self.settings.remote,
        );

        info!(job = %job_id, source = %job.source_path, "Pipeline started");
        let outcome = match resolved {
            Ok(paths) => self.run_stages(&job, &paths)?,
            Err(e) => {
                self.executor.abort(job.id, Stage::TransferIn, &e.to_string())?;
                PipelineOutcome::Failed(Stage::TransferIn)
            }
        };

        match outcome {
            PipelineOutcome::Completed => info!(job = %job_id, "Pipeline completed"),
            PipelineOutcome::Failed(stage) => warn!(job = %job_id, stage = %stage, "Pipeline halted"),
            _ => {}
        }
        Ok(outcome)
    }

    fn run_stages(&self, job: &JobSnapshot, paths: &JobPaths) -> Result<PipelineOutcome> {
        let settings = &self.settings;

        // 1. Pull the remote source into the per-job temp directory.
        if let Err(note) = create_dir(&paths.temp_dir) {
            self.executor.abort(job.id, Stage::TransferIn, &note)?;
            return Ok(PipelineOutcome::Failed(Stage::TransferIn));
        }
        let temp_dest = format!("{}/", paths.temp_dir.display());
        let cmd = settings.transfer.command(&paths.pull_source, &temp_dest);
        if !self.executor.run_transfer(job.id, Stage::TransferIn, &cmd)?.is_success() {
            return Ok(PipelineOutcome::Failed(Stage::TransferIn));
        }

        // 2. Back up the original on the remote host.
        let cmd = settings.remote_copy.command(
            &settings.remote.identity(),
            &job.source_path,
            &settings.remote.archive_dir,
        );
        if !self.executor.run_remote_copy(job.id, &cmd)?.is_success() {
            return Ok(PipelineOutcome::Failed(Stage::BackupSource));
        }

        // 3. Transcode into the job-id-prefixed output.
        if let Err(note) = create_dir(&paths.output_dir) {
            self.executor.abort(job.id, Stage::Processing, &note)?;
            return Ok(PipelineOutcome::Failed(Stage::Processing));
        }
        let tokens = spec_tokens(&job.conversion_spec);
        let cmd = settings
            .transcode
            .command(&paths.temp_file, &tokens, &paths.prefixed_output);
        if self.executor.run_transcode(job.id, &cmd, &paths.prefixed_output)? == StageOutcome::Failed {
            return Ok(PipelineOutcome::Failed(Stage::Processing));
        }

        // 4. Strip the prefix.
        if let Err(note) = rename_output(paths) {
            warn!(job = %job.id, "{}", note);
            self.ledger
                .update(job.id, JobStatus::ProcessingFailed, None, Some(&note))?;
            return Ok(PipelineOutcome::Failed(Stage::Processing));
        }

        // 5. Push the clean artifact next to the original source.
        let clean = paths.clean_output.to_string_lossy();
        let cmd = settings.transfer.command(&clean, &paths.push_destination);
        if !self.executor.run_transfer(job.id, Stage::TransferOut, &cmd)?.is_success() {
            return Ok(PipelineOutcome::Failed(Stage::TransferOut));
        }

        // 6. Remove local working files.
        if settings.skip_cleanup {
            info!(job = %job.id, "Skipping cleanup of local working files");
        } else {
            cleanup(paths);
        }

        // 7. Done.
        self.ledger.update(
            job.id,
            JobStatus::Completed,
            Some(100.0),
            Some("All stages successful."),
        )?;
        Ok(PipelineOutcome::Completed)
    }
}

/// Create a per-job working directory. The error is the ledger note.
fn create_dir(dir: &Path) -> std::result::Result<(), String> {
    std::fs::create_dir_all(dir).map_err(|e| {
        let note = format!("Failed to create working directory {}: {}", dir.display(), e);
        error!("{}", note);
        note
    })
}

/// Rename the prefixed transcoder output to its clean name. The error is the
/// ledger note.
fn rename_output(paths: &JobPaths) -> std::result::Result<(), String> {
    if !paths.prefixed_output.exists() {
        return Err(format!(
            "Transcoded output {} is missing; nothing to rename.",
            paths.prefixed_output.display()
        ));
    }
    if paths.prefixed_output == paths.clean_output {
        return Ok(());
    }
    std::fs::rename(&paths.prefixed_output, &paths.clean_output).map_err(|e| {
        format!(
            "Failed to rename {} to {}: {}",
            paths.prefixed_output.display(),
            paths.clean_output.display(),
            e
        )
    })
}

fn cleanup(paths: &JobPaths) {
    for dir in [&paths.temp_dir, &paths.output_dir] {
        match std::fs::remove_dir_all(dir) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove {:?}: {}", dir, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relayforge_common::paths::{LocalLayout, RemoteTarget};

    fn paths_in(dir: &Path) -> JobPaths {
        let layout = LocalLayout::new(dir.join("temp"), dir.join("output"));
        let id = JobId::new();
        let output = layout.output_path_for(id, "/remote/clip.mkv", "mp4").unwrap();
        JobPaths::resolve(id, "/remote/clip.mkv", &output, &layout, &RemoteTarget::new("u", "h", "/a")).unwrap()
    }

    #[test]
    fn test_rename_output_strips_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let paths = paths_in(dir.path());
        std::fs::create_dir_all(&paths.output_dir).unwrap();
        std::fs::write(&paths.prefixed_output, b"video").unwrap();

        rename_output(&paths).unwrap();
        assert!(!paths.prefixed_output.exists());
        assert!(paths.clean_output.exists());
    }

    #[test]
    fn test_rename_output_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let paths = paths_in(dir.path());
        let note = rename_output(&paths).unwrap_err();
        assert!(note.contains("missing"));
    }

    #[test]
    fn test_create_dir_under_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("output");
        std::fs::write(&blocker, b"not a directory").unwrap();

        let note = create_dir(&blocker.join("job")).unwrap_err();
        assert!(note.starts_with("Failed to create working directory"));
    }

    #[test]
    fn test_cleanup_removes_job_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let paths = paths_in(dir.path());
        std::fs::create_dir_all(&paths.temp_dir).unwrap();
        std::fs::create_dir_all(&paths.output_dir).unwrap();
        std::fs::write(&paths.temp_file, b"src").unwrap();
        std::fs::write(&paths.clean_output, b"out").unwrap();

        cleanup(&paths);
        assert!(!paths.temp_dir.exists());
        assert!(!paths.output_dir.exists());
        // Roots stay
        assert!(dir.path().join("temp").exists());

        // Second pass is a no-op
        cleanup(&paths);
    }
}
