//! Database methods for the runs and raw_run_records tables

use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, Result as SqliteResult};

use crate::db::Database;
use crate::models::RunRow;

impl Database {
    /// Fast duplicate pre-check. The authoritative reservation is the
    /// primary-key insert in `insert_run`.
    pub fn run_exists(&self, run_hash: &str) -> SqliteResult<bool> {
        let conn = self.conn();
        let found: Option<i64> = conn
            .query_row("SELECT 1 FROM runs WHERE run_hash = ?1", [run_hash], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(found.is_some())
    }

    /// Insert a finalized run. Returns false when the hash was already
    /// finalized - the existing row is never overwritten. This single
    /// statement is the idempotency reservation: of two concurrent
    /// finalizations for one hash, exactly one sees `true`.
    pub fn insert_run(
        &self,
        run_hash: &str,
        wallet: &str,
        extraction_value: &str,
        identity_commitment: &str,
        status: &str,
        now: DateTime<Utc>,
    ) -> SqliteResult<bool> {
        let conn = self.conn();
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO runs (run_hash, wallet, extraction_value, identity_commitment, status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![run_hash, wallet, extraction_value, identity_commitment, status, now.to_rfc3339()],
        )?;
        Ok(inserted > 0)
    }

    pub fn get_run(&self, run_hash: &str) -> SqliteResult<Option<RunRow>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT run_hash, wallet, extraction_value, identity_commitment, status, created_at
             FROM runs WHERE run_hash = ?1",
        )?;

        let row = stmt
            .query_row([run_hash], |row| {
                let created_at_str: String = row.get(5)?;
                Ok(RunRow {
                    run_hash: row.get(0)?,
                    wallet: row.get(1)?,
                    extraction_value: row.get(2)?,
                    identity_commitment: row.get(3)?,
                    status: row.get(4)?,
                    created_at: DateTime::parse_from_rfc3339(&created_at_str)
                        .unwrap()
                        .with_timezone(&Utc),
                })
            })
            .optional()?;

        Ok(row)
    }

    /// Append one raw submission. Never deduplicated, never mutated.
    pub fn insert_raw_run_record(
        &self,
        wallet: &str,
        payload: &str,
        run_hash: &str,
        extraction_value: &str,
        status: &str,
        now: DateTime<Utc>,
    ) -> SqliteResult<()> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO raw_run_records (wallet, payload, run_hash, extraction_value, status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![wallet, payload, run_hash, extraction_value, status, now.to_rfc3339()],
        )?;
        Ok(())
    }

    pub fn count_raw_run_records(&self, run_hash: &str) -> SqliteResult<i64> {
        let conn = self.conn();
        conn.query_row(
            "SELECT COUNT(*) FROM raw_run_records WHERE run_hash = ?1",
            [run_hash],
            |row| row.get(0),
        )
    }
}
