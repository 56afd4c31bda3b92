//! Database methods for the rate_limit_counters table
//!
//! Fixed-window admission control. The counter resets at fixed boundaries,
//! so a burst straddling a window edge can reach roughly twice the limit in
//! a short span; that is the accepted trade-off for this limiter.

use rusqlite::{OptionalExtension, Result as SqliteResult};

use crate::db::Database;

#[derive(Debug, Clone, Copy)]
pub struct RateDecision {
    pub allowed: bool,
    pub retry_after_ms: Option<i64>,
}

impl Database {
    /// Check and update the counter for `key` as one atomic unit: the read
    /// and the write happen under a single connection-lock acquisition, so
    /// two concurrent requests for the same key cannot both pass a
    /// count-of-`limit - 1` check.
    pub fn check_rate_limit(
        &self,
        key: &str,
        limit: u32,
        window_ms: i64,
        now_ms: i64,
    ) -> SqliteResult<RateDecision> {
        let conn = self.conn();

        let existing: Option<(i64, i64)> = conn
            .query_row(
                "SELECT window_start_ms, count FROM rate_limit_counters WHERE key = ?1",
                [key],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        match existing {
            None => {
                conn.execute(
                    "INSERT INTO rate_limit_counters (key, window_start_ms, count) VALUES (?1, ?2, 1)",
                    rusqlite::params![key, now_ms],
                )?;
                Ok(RateDecision { allowed: true, retry_after_ms: None })
            }
            Some((window_start, _)) if now_ms - window_start >= window_ms => {
                // Window elapsed: reset and admit
                conn.execute(
                    "UPDATE rate_limit_counters SET window_start_ms = ?1, count = 1 WHERE key = ?2",
                    rusqlite::params![now_ms, key],
                )?;
                Ok(RateDecision { allowed: true, retry_after_ms: None })
            }
            Some((_, count)) if count < limit as i64 => {
                conn.execute(
                    "UPDATE rate_limit_counters SET count = count + 1 WHERE key = ?1",
                    [key],
                )?;
                Ok(RateDecision { allowed: true, retry_after_ms: None })
            }
            Some((window_start, _)) => Ok(RateDecision {
                allowed: false,
                retry_after_ms: Some(window_ms - (now_ms - window_start)),
            }),
        }
    }

    /// Drop counters whose window ended before `now_ms`. Counters are
    /// ephemeral; this keeps the table from growing unbounded.
    pub fn evict_expired_rate_counters(&self, window_ms: i64, now_ms: i64) -> SqliteResult<usize> {
        let conn = self.conn();
        conn.execute(
            "DELETE FROM rate_limit_counters WHERE ?1 - window_start_ms >= ?2",
            rusqlite::params![now_ms, window_ms],
        )
    }
}
