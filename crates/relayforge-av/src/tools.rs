//! External tool detection and management.

use crate::{Error, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Information about an external tool.
#[derive(Debug, Clone, Serialize)]
pub struct ToolInfo {
    /// Name of the tool.
    pub name: String,
    /// Whether the tool is available.
    pub available: bool,
    /// Version string if available.
    pub version: Option<String>,
    /// Path to the tool executable.
    pub path: Option<PathBuf>,
}

/// Check if a tool is available and get its information.
///
/// # Example
///
/// ```no_run
/// use relayforge_av::check_tool;
///
/// let info = check_tool("rsync");
/// if info.available {
///     println!("rsync version: {:?}", info.version);
/// }
/// ```
pub fn check_tool(name: &str) -> ToolInfo {
    check_tool_with_arg(name, "--version")
}

/// Check if a tool is available using a custom version argument.
///
/// Some tools (ssh) print their version on stderr; the first non-empty line
/// of stdout, then stderr, is taken as the version.
pub fn check_tool_with_arg(name: &str, version_arg: &str) -> ToolInfo {
    let result = Command::new(name)
        .arg(version_arg)
        .stdin(Stdio::null())
        .output();

    match result {
        Ok(output) if output.status.success() => {
            let first_line = |bytes: &[u8]| {
                String::from_utf8_lossy(bytes)
                    .lines()
                    .map(str::trim)
                    .find(|l| !l.is_empty())
                    .map(|s| s.to_string())
            };
            let version = first_line(&output.stdout).or_else(|| first_line(&output.stderr));

            let path = which::which(name).ok();

            ToolInfo {
                name: name.to_string(),
                available: true,
                version,
                path,
            }
        }
        _ => ToolInfo {
            name: name.to_string(),
            available: false,
            version: None,
            path: None,
        },
    }
}

/// Check the tools a pipeline run needs: rsync, ssh and ffmpeg.
pub fn check_tools_at(rsync: &Path, ssh: &Path, ffmpeg: &Path) -> Vec<ToolInfo> {
    vec![
        check_tool(&rsync.to_string_lossy()),
        check_tool_with_arg(&ssh.to_string_lossy(), "-V"),
        check_tool_with_arg(&ffmpeg.to_string_lossy(), "-version"),
    ]
}

/// Require that a tool is available, returning its path.
///
/// # Errors
///
/// Returns an error if the tool is not found.
pub fn require_tool(name: &str) -> Result<PathBuf> {
    which::which(name).map_err(|_| Error::tool_not_found(name))
}

/// Get the path to a tool, preferring a configured path over PATH lookup.
pub fn get_tool_path(name: &str, config_path: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = config_path {
        if path.exists() {
            return Ok(path.to_path_buf());
        }
    }

    require_tool(name)
}

/// Resolve a tool for execution, falling back to the bare name.
///
/// A missing tool is not an error here; spawning it fails later and that
/// failure is recorded against the stage that needed it.
pub fn resolve_tool(name: &str, config_path: Option<&Path>) -> PathBuf {
    get_tool_path(name, config_path).unwrap_or_else(|_| {
        #[cfg(feature = "tracing")]
        tracing::warn!(tool = name, "Tool not found, relying on PATH at run time");
        PathBuf::from(name)
    })
}
