//! rsync-based file transfers.

use std::path::PathBuf;

use crate::command::{shell_quote, ToolCommand};

/// Flags applied to every transfer: archive mode, compression, keep partial
/// files for resumption, and report progress.
pub const TRANSFER_FLAGS: [&str; 3] = ["-az", "--partial", "--progress"];

/// Builds transfer commands between local paths and `user@host:path`
/// locators.
#[derive(Debug, Clone)]
pub struct TransferTool {
    rsync: PathBuf,
    ssh: PathBuf,
    ssh_key: Option<PathBuf>,
}

impl TransferTool {
    pub fn new(rsync: impl Into<PathBuf>, ssh: impl Into<PathBuf>, ssh_key: Option<PathBuf>) -> Self {
        Self {
            rsync: rsync.into(),
            ssh: ssh.into(),
            ssh_key,
        }
    }

    /// Command copying `source` to `destination`.
    ///
    /// With a signing key configured the transfer runs over
    /// `ssh -i <key>`; otherwise rsync picks its default remote shell.
    pub fn command(&self, source: &str, destination: &str) -> ToolCommand {
        let mut cmd = ToolCommand::new(&self.rsync);
        cmd.args_from(TRANSFER_FLAGS);
        if let Some(key) = &self.ssh_key {
            cmd.arg("-e").arg(format!(
                "{} -i {}",
                shell_quote(&self.ssh.to_string_lossy()),
                shell_quote(&key.to_string_lossy())
            ));
        }
        cmd.arg(source).arg(destination);
        cmd
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_transfer_without_key() {
        let tool = TransferTool::new("rsync", "ssh", None);
        let cmd = tool.command("media@nas:/remote/media/clip.mkv", "/work/temp/1/");
        assert_eq!(cmd.program(), Path::new("rsync"));
        assert_eq!(
            cmd.args(),
            ["-az", "--partial", "--progress", "media@nas:/remote/media/clip.mkv", "/work/temp/1/"]
        );
    }

    #[test]
    fn test_transfer_with_key() {
        let tool = TransferTool::new("/usr/bin/rsync", "/usr/bin/ssh", Some("/keys/id ed25519".into()));
        let cmd = tool.command("/work/output/1/clip.mp4", "media@nas:/remote/media");
        assert_eq!(
            cmd.args(),
            [
                "-az",
                "--partial",
                "--progress",
                "-e",
                "'/usr/bin/ssh' -i '/keys/id ed25519'",
                "/work/output/1/clip.mp4",
                "media@nas:/remote/media",
            ]
        );
    }
}
