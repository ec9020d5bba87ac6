//! Relayforge-DB: the durable job ledger.
//!
//! Jobs are stored in SQLite through rusqlite with r2d2 connection pooling.
//!
//! # Modules
//!
//! - `migrations` - Embedded schema migrations
//! - `pool` - Connection pool management
//! - `models` - The [`JobSnapshot`](models::JobSnapshot) row model
//! - `queries` - Free query functions over a `Connection`
//! - `ledger` - The [`JobLedger`](ledger::JobLedger) trait and its SQLite implementation
//!
//! # Example
//!
//! ```
//! use relayforge_common::{JobId, JobStatus};
//! use relayforge_db::ledger::{JobLedger, NewJob, SqliteLedger};
//! use relayforge_db::pool::init_memory_pool;
//!
//! let ledger = SqliteLedger::new(init_memory_pool().unwrap());
//! let id = JobId::new();
//! ledger
//!     .create(&NewJob::new(
//!         id,
//!         "/remote/media/clip.mkv",
//!         "/work/output/clip.mp4",
//!         "-c:v libx265 -crf 28",
//!     ))
//!     .unwrap();
//!
//! let job = ledger.get(id).unwrap().unwrap();
//! assert_eq!(job.status, JobStatus::Submitted);
//! ```

pub mod ledger;
pub mod migrations;
pub mod models;
pub mod pool;
pub mod queries;

pub use ledger::{JobLedger, NewJob, SqliteLedger};
pub use models::JobSnapshot;
