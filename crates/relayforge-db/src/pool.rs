//! Database connection pool management.
//!
//! Connection pooling for SQLite using r2d2. Every connection commits
//! synchronously so a ledger update is durable once the call returns.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use relayforge_common::{Error, Result};
use rusqlite::Connection;

use crate::migrations;

/// Type alias for the database connection pool.
pub type DbPool = Pool<SqliteConnectionManager>;

/// Type alias for a pooled database connection.
pub type PooledConnection = r2d2::PooledConnection<SqliteConnectionManager>;

const POOL_SIZE: u32 = 4;
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

fn configure_connection(conn: &mut Connection) -> rusqlite::Result<()> {
    conn.busy_timeout(BUSY_TIMEOUT)?;
    conn.execute_batch("PRAGMA foreign_keys = ON; PRAGMA synchronous = FULL;")
}

fn build_pool(manager: SqliteConnectionManager, what: &str) -> Result<DbPool> {
    let pool = Pool::builder()
        .max_size(POOL_SIZE)
        .build(manager.with_init(configure_connection))
        .map_err(|e| Error::database(format!("Failed to create {}: {}", what, e)))?;

    let conn = pool
        .get()
        .map_err(|e| Error::database(format!("Failed to get connection for migrations: {}", e)))?;

    migrations::run_migrations(&conn)
        .map_err(|e| Error::database(format!("Failed to run migrations: {}", e)))?;

    Ok(pool)
}

/// Initialize a database pool backed by the SQLite file at `db_path`.
///
/// The file is created if it does not exist and pending migrations are
/// applied before the pool is returned.
///
/// ```no_run
/// use relayforge_db::pool::init_pool;
///
/// let pool = init_pool("/var/lib/relayforge/jobs.sqlite").unwrap();
/// let conn = pool.get().unwrap();
/// ```
pub fn init_pool(db_path: &str) -> Result<DbPool> {
    build_pool(SqliteConnectionManager::file(db_path), "connection pool")
}

/// Initialize an in-memory database pool for testing.
///
/// Each call gets its own named shared-cache database, so every connection
/// handed out by one pool sees the same tables while separate pools stay
/// isolated. The database is lost when the pool is dropped.
///
/// ```
/// use relayforge_db::pool::init_memory_pool;
///
/// let pool = init_memory_pool().unwrap();
/// let conn = pool.get().unwrap();
/// ```
pub fn init_memory_pool() -> Result<DbPool> {
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    let uri = format!("file:relayforge_mem_{n}?mode=memory&cache=shared");

    build_pool(SqliteConnectionManager::file(uri), "in-memory pool")
}

/// Get a connection from the pool.
pub fn get_conn(pool: &DbPool) -> Result<PooledConnection> {
    pool.get()
        .map_err(|e| Error::database(format!("Failed to get connection from pool: {}", e)))
}
