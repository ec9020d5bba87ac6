//! Database query modules.
//!
//! Each function takes a borrowed `Connection` so callers decide how
//! connections are pooled:
//! - jobs: Job ledger rows (create, update, lookup, listing, queue claims)

pub mod jobs;
