//! Same-host copies executed over ssh.
//!
//! The copy runs entirely on the storage host, so the file never crosses the
//! network. The remote command string is interpreted by the remote shell;
//! every path in it is single-quote escaped.

use std::path::PathBuf;

use crate::command::{shell_quote, ToolCommand};

/// Builds ssh commands that copy a file into a directory on the remote host.
#[derive(Debug, Clone)]
pub struct RemoteCopyTool {
    ssh: PathBuf,
    ssh_key: Option<PathBuf>,
}

impl RemoteCopyTool {
    pub fn new(ssh: impl Into<PathBuf>, ssh_key: Option<PathBuf>) -> Self {
        Self {
            ssh: ssh.into(),
            ssh_key,
        }
    }

    /// Command copying `source` into `archive_dir` on `identity` (`user@host`).
    pub fn command(&self, identity: &str, source: &str, archive_dir: &str) -> ToolCommand {
        let mut cmd = ToolCommand::new(&self.ssh);
        if let Some(key) = &self.ssh_key {
            cmd.arg("-i").arg(key.to_string_lossy());
        }
        // Never prompt for a password.
        cmd.args_from(["-o", "BatchMode=yes"]);
        cmd.arg(identity).arg(remote_copy_script(source, archive_dir));
        cmd
    }
}

/// Shell command run on the remote host.
pub fn remote_copy_script(source: &str, archive_dir: &str) -> String {
    let dir = archive_dir.trim_end_matches('/');
    let dir = if dir.is_empty() { "/" } else { dir };
    format!("cp -p -- {} {}/", shell_quote(source), shell_quote(dir))
}
