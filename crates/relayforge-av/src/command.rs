//! Argument-vector commands and the runner seam that executes them.
//!
//! A [`ToolCommand`] is a program plus its arguments. Nothing here ever goes
//! through a local shell, so caller-supplied text reaches the tool as a single
//! argument no matter what characters it contains.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::{Error, Result};

/// Output captured from a tool execution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    /// Exit code, or `None` if the process was terminated by a signal.
    pub exit_code: Option<i32>,
    /// Captured standard output (lossy UTF-8).
    pub stdout: String,
    /// Captured standard error (lossy UTF-8).
    pub stderr: String,
}

impl ToolOutput {
    /// Whether the process exited with code 0.
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Exit code rendered for diagnostics.
    pub fn exit_label(&self) -> String {
        match self.exit_code {
            Some(code) => code.to_string(),
            None => "signal".to_string(),
        }
    }
}

/// A program and its argument vector.
///
/// # Example
///
/// ```
/// use relayforge_av::ToolCommand;
///
/// let mut cmd = ToolCommand::new("rsync");
/// cmd.arg("-az").arg("user@host:/media/my clip.mkv").arg("/tmp/work/");
/// assert_eq!(cmd.args().len(), 3);
/// assert_eq!(cmd.display(), "rsync -az 'user@host:/media/my clip.mkv' /tmp/work/");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    program: PathBuf,
    args: Vec<String>,
}

impl ToolCommand {
    /// Create a new command for the given program.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Append a single argument.
    pub fn arg(&mut self, s: impl Into<String>) -> &mut Self {
        self.args.push(s.into());
        self
    }

    /// Append multiple arguments.
    pub fn args_from(&mut self, iter: impl IntoIterator<Item = impl Into<String>>) -> &mut Self {
        self.args.extend(iter.into_iter().map(Into::into));
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Short tool name, e.g. `ffmpeg` for `/usr/bin/ffmpeg`.
    pub fn tool_name(&self) -> String {
        self.program
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.program.to_string_lossy().into_owned())
    }

    /// Human-readable command line, quoting arguments that need it.
    ///
    /// For logs and ledger notes only; it is never executed.
    pub fn display(&self) -> String {
        std::iter::once(self.program.to_string_lossy().into_owned())
            .chain(self.args.iter().cloned())
            .map(|part| display_quote(&part))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn display_quote(part: &str) -> String {
    let plain = !part.is_empty()
        && part
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:=@,+%".contains(c));
    if plain {
        part.to_string()
    } else {
        shell_quote(part)
    }
}

/// Quote `s` as one POSIX shell word.
///
/// Used where an argument must survive a shell on the far end, such as the
/// command string handed to `ssh`.
pub fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}

/// Executes [`ToolCommand`]s.
///
/// The pipeline depends on this trait rather than on process spawning so the
/// external tools can be scripted in tests.
pub trait CommandRunner: Send + Sync {
    /// Run `cmd` to completion, capturing both output streams.
    ///
    /// Returns `Err` only if the process could not be run; a non-zero exit is
    /// reported through [`ToolOutput::exit_code`].
    fn run(&self, cmd: &ToolCommand) -> Result<ToolOutput>;
}

/// Runs commands as blocking child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, cmd: &ToolCommand) -> Result<ToolOutput> {
        #[cfg(feature = "tracing")]
        tracing::debug!(command = %cmd.display(), "Running external tool");

        let output = Command::new(cmd.program())
            .args(cmd.args())
            .stdin(Stdio::null())
            .output()
            .map_err(|e| Error::tool_failed(cmd.tool_name(), format!("failed to spawn: {}", e)))?;

        Ok(ToolOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
