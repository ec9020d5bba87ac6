//! # relayforge-av
//!
//! External tool plumbing for the relayforge job pipeline.
//!
//! This crate provides:
//! - [`ToolCommand`]: a program plus argument vector, never run through a shell
//! - [`CommandRunner`]: the seam every external process goes through, with
//!   [`SystemRunner`] as the real implementation
//! - Builders for rsync transfers, ssh same-host copies and ffmpeg transcodes
//! - Conversion spec tokenizing and allow-list checks
//! - Tool detection
//!
//! ## Features
//!
//! - `tracing` - Enable tracing support
//!
//! ## Example
//!
//! ```
//! use relayforge_av::{SpecPolicy, TranscodeTool};
//! use std::path::Path;
//!
//! let tokens = SpecPolicy::default().validate("-c:v libx265 -crf 28")?;
//! let cmd = TranscodeTool::new("ffmpeg").command(
//!     Path::new("/work/temp/clip.mkv"),
//!     &tokens,
//!     Path::new("/work/output/clip.mp4"),
//! );
//! assert_eq!(cmd.args()[0], "-i");
//! # Ok::<(), relayforge_av::Error>(())
//! ```

pub mod command;
mod error;
pub mod remote;
pub mod tools;
pub mod transcode;
pub mod transfer;

// Re-exports
pub use command::{shell_quote, CommandRunner, SystemRunner, ToolCommand, ToolOutput};
pub use error::{Error, Result};
pub use remote::RemoteCopyTool;
pub use tools::{check_tool, check_tools_at, require_tool, resolve_tool, ToolInfo};
pub use transcode::{spec_tokens, SpecPolicy, TranscodeTool, DEFAULT_ALLOWED_OPTIONS};
pub use transfer::TransferTool;
