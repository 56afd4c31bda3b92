use rusqlite::{Connection, Result as SqliteResult};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

pub mod tables;

pub use tables::rate_limits::RateDecision;

/// All persistent state lives in SQLite behind a single connection.
///
/// The `Mutex<Connection>` serializes every access, so any read-then-write
/// sequence performed under one `conn()` guard is an atomic unit with
/// respect to concurrent requests. The rate-limit check-and-update and the
/// run reservation rely on this.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    pub fn new(database_url: &str) -> SqliteResult<Self> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = Path::new(database_url).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).ok();
            }
        }

        let conn = Connection::open(database_url)?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.init()?;
        Ok(db)
    }

    pub(crate) fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap()
    }

    fn init(&self) -> SqliteResult<()> {
        let conn = self.conn.lock().unwrap();

        conn.execute(
            "CREATE TABLE IF NOT EXISTS identities (
                wallet TEXT PRIMARY KEY,
                commitment TEXT NOT NULL,
                verified INTEGER NOT NULL DEFAULT 0,
                last_verification_request_at TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )?;

        // run_hash is globally unique; rows are never updated or deleted
        conn.execute(
            "CREATE TABLE IF NOT EXISTS runs (
                run_hash TEXT PRIMARY KEY,
                wallet TEXT NOT NULL,
                extraction_value TEXT NOT NULL,
                identity_commitment TEXT NOT NULL,
                status TEXT NOT NULL,
                created_at TEXT NOT NULL
            )",
            [],
        )?;

        // Append-only log of every raw submission, never deduplicated
        conn.execute(
            "CREATE TABLE IF NOT EXISTS raw_run_records (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                wallet TEXT NOT NULL,
                payload TEXT NOT NULL,
                run_hash TEXT NOT NULL,
                extraction_value TEXT NOT NULL,
                status TEXT NOT NULL,
                created_at TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS faucet_claims (
                wallet TEXT NOT NULL,
                token TEXT NOT NULL,
                last_claim_at TEXT NOT NULL,
                PRIMARY KEY (wallet, token)
            )",
            [],
        )?;

        // Ephemeral counters; rows are safe to evict once their window elapses
        conn.execute(
            "CREATE TABLE IF NOT EXISTS rate_limit_counters (
                key TEXT PRIMARY KEY,
                window_start_ms INTEGER NOT NULL,
                count INTEGER NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS audit_log (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                event_type TEXT NOT NULL,
                wallet TEXT,
                details TEXT NOT NULL,
                success INTEGER NOT NULL,
                created_at TEXT NOT NULL
            )",
            [],
        )?;

        Ok(())
    }
}
