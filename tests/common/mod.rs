//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`], which wires an in-memory ledger, a
//! [`ScriptedRunner`] in place of the real tools, and a temporary working
//! tree into a [`PipelineOrchestrator`] and [`JobService`].

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use relayforge::config::Config;
use relayforge::pipeline::{PipelineOrchestrator, PipelineSettings};
use relayforge::service::JobService;
use relayforge_av::{CommandRunner, ToolCommand, ToolOutput};
use relayforge_common::{JobId, JobStatus, Result};
use relayforge_db::pool::init_memory_pool;
use relayforge_db::{JobLedger, JobSnapshot, NewJob, SqliteLedger};
use tempfile::TempDir;

/// Stand-in for the external tools.
///
/// Records every command it is asked to run. A tool succeeds unless a
/// failure was scripted for it with [`ScriptedRunner::fail_on`], or for its
/// call number with [`ScriptedRunner::fail_call`]. A successful `ffmpeg` run
/// writes its output file (the last argument).
#[derive(Default)]
pub struct ScriptedRunner {
    calls: Mutex<Vec<ToolCommand>>,
    failures: Mutex<HashMap<String, (i32, String)>>,
    call_failures: Mutex<HashMap<usize, (i32, String)>>,
    stderr: Mutex<HashMap<String, String>>,
    skip_output: Mutex<bool>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `tool` exit with `code` and print `stderr`.
    pub fn fail_on(&self, tool: &str, code: i32, stderr: &str) {
        self.failures
            .lock()
            .unwrap()
            .insert(tool.to_string(), (code, stderr.to_string()));
    }

    /// Make the `index`th command (from 0) exit with `code` and print
    /// `stderr`, whichever tool it is.
    pub fn fail_call(&self, index: usize, code: i32, stderr: &str) {
        self.call_failures
            .lock()
            .unwrap()
            .insert(index, (code, stderr.to_string()));
    }

    /// Make `tool` exit 0 but print `stderr`.
    pub fn warn_on(&self, tool: &str, stderr: &str) {
        self.stderr
            .lock()
            .unwrap()
            .insert(tool.to_string(), stderr.to_string());
    }

    /// Let ffmpeg "succeed" without writing anything.
    pub fn skip_transcode_output(&self) {
        *self.skip_output.lock().unwrap() = true;
    }

    pub fn calls(&self) -> Vec<ToolCommand> {
        self.calls.lock().unwrap().clone()
    }

    pub fn tools_called(&self) -> Vec<String> {
        self.calls().iter().map(|c| c.tool_name()).collect()
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, cmd: &ToolCommand) -> relayforge_av::Result<ToolOutput> {
        let index = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(cmd.clone());
            calls.len() - 1
        };
        let tool = cmd.tool_name();

        let failure = self
            .call_failures
            .lock()
            .unwrap()
            .get(&index)
            .cloned()
            .or_else(|| self.failures.lock().unwrap().get(&tool).cloned());
        if let Some((code, stderr)) = failure {
            return Ok(ToolOutput {
                exit_code: Some(code),
                stdout: String::new(),
                stderr,
            });
        }

        if tool == "ffmpeg" && !*self.skip_output.lock().unwrap() {
            if let Some(output) = cmd.args().last() {
                std::fs::write(output, b"transcoded")?;
            }
        }

        Ok(ToolOutput {
            exit_code: Some(0),
            stdout: String::new(),
            stderr: self
                .stderr
                .lock()
                .unwrap()
                .get(&tool)
                .cloned()
                .unwrap_or_default(),
        })
    }
}

type UpdateHook = Box<dyn Fn(&JobSnapshot) + Send + Sync>;

/// Ledger wrapper that remembers every status written, in order.
pub struct RecordingLedger {
    inner: SqliteLedger,
    statuses: Mutex<Vec<JobStatus>>,
    hooks: Mutex<Vec<(JobStatus, UpdateHook)>>,
}

impl RecordingLedger {
    pub fn new() -> Self {
        Self {
            inner: SqliteLedger::new(init_memory_pool().expect("failed to create in-memory pool")),
            statuses: Mutex::new(Vec::new()),
            hooks: Mutex::new(Vec::new()),
        }
    }

    pub fn statuses(&self) -> Vec<JobStatus> {
        self.statuses.lock().unwrap().clone()
    }

    /// Run `hook` with the updated row each time `status` is written.
    pub fn on_update(&self, status: JobStatus, hook: impl Fn(&JobSnapshot) + Send + Sync + 'static) {
        self.hooks.lock().unwrap().push((status, Box::new(hook)));
    }
}

impl JobLedger for RecordingLedger {
    fn create(&self, job: &NewJob<'_>) -> Result<JobSnapshot> {
        let created = self.inner.create(job)?;
        self.statuses.lock().unwrap().push(created.status);
        Ok(created)
    }

    fn update(
        &self,
        id: JobId,
        status: JobStatus,
        progress_percent: Option<f64>,
        notes: Option<&str>,
    ) -> Result<()> {
        self.inner.update(id, status, progress_percent, notes)?;
        self.statuses.lock().unwrap().push(status);

        let hooks = self.hooks.lock().unwrap();
        if hooks.iter().any(|(s, _)| *s == status) {
            if let Some(job) = self.inner.get(id)? {
                for (_, hook) in hooks.iter().filter(|(s, _)| *s == status) {
                    hook(&job);
                }
            }
        }
        Ok(())
    }

    fn get(&self, id: JobId) -> Result<Option<JobSnapshot>> {
        self.inner.get(id)
    }

    fn list(&self, status: Option<JobStatus>, limit: usize) -> Result<Vec<JobSnapshot>> {
        self.inner.list(status, limit)
    }

    fn claim_next_submitted(&self, worker: &str) -> Result<Option<JobSnapshot>> {
        self.inner.claim_next_submitted(worker)
    }
}

/// Config pointing at `root` for all local working files.
pub fn test_config(root: &std::path::Path) -> Config {
    let mut config = Config::default();
    config.remote.user = "media".into();
    config.remote.host = "nas.local".into();
    config.remote.archive_dir = "/remote/archive".into();
    config.paths.database = root.join("relayforge.db");
    config.paths.temp_dir = root.join("temp");
    config.paths.output_dir = root.join("output");
    config.tools.rsync_path = Some(PathBuf::from("rsync"));
    config.tools.ssh_path = Some(PathBuf::from("ssh"));
    config.tools.ffmpeg_path = Some(PathBuf::from("ffmpeg"));
    config
}

/// Orchestrator and service over an in-memory ledger and scripted tools.
pub struct TestHarness {
    pub dir: TempDir,
    pub ledger: Arc<dyn JobLedger>,
    pub runner: Arc<ScriptedRunner>,
    pub orchestrator: Arc<PipelineOrchestrator>,
    pub service: JobService,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with(|_| {})
    }

    /// Build a harness after adjusting the config.
    pub fn with(adjust: impl FnOnce(&mut Config)) -> Self {
        let ledger: Arc<dyn JobLedger> = Arc::new(SqliteLedger::new(
            init_memory_pool().expect("failed to create in-memory pool"),
        ));
        Self::with_ledger(ledger, adjust)
    }

    pub fn with_ledger(ledger: Arc<dyn JobLedger>, adjust: impl FnOnce(&mut Config)) -> Self {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let mut config = test_config(dir.path());
        adjust(&mut config);

        let runner = Arc::new(ScriptedRunner::new());
        let orchestrator = Arc::new(PipelineOrchestrator::new(
            Arc::clone(&ledger),
            runner.clone(),
            PipelineSettings::from_config(&config),
        ));
        let service = JobService::new(Arc::clone(&orchestrator));

        Self {
            dir,
            ledger,
            runner,
            orchestrator,
            service,
        }
    }

    pub fn job(&self, id: JobId) -> JobSnapshot {
        self.ledger
            .get(id)
            .expect("ledger read failed")
            .expect("job missing")
    }

    pub fn temp_root(&self) -> PathBuf {
        self.dir.path().join("temp")
    }

    pub fn output_root(&self) -> PathBuf {
        self.dir.path().join("output")
    }
}
