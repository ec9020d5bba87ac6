//! Relayforge-Common: Shared types and utilities.
//!
//! This crate provides functionality used across relayforge:
//!
//! - **Typed IDs**: [`JobId`], a UUID wrapper for conversion jobs
//! - **Job states**: the [`JobStatus`] state machine and the ordered [`Stage`]s
//! - **Path resolution**: local working paths and remote locators per job
//! - **Error handling**: common error types and result aliases
//!
//! # Examples
//!
//! ```
//! use relayforge_common::{JobId, JobStatus, Stage};
//! use relayforge_common::paths::strip_job_prefix;
//!
//! let id = JobId::new();
//! assert_eq!(Stage::TransferIn.running(), JobStatus::TransferringIn);
//!
//! assert_eq!(strip_job_prefix("abc123", "abc123_movie.mp4"), "movie.mp4");
//! # let _ = id;
//! ```

pub mod error;
pub mod ids;
pub mod paths;
pub mod types;

pub use error::{Error, Result};
pub use ids::*;
pub use types::*;
