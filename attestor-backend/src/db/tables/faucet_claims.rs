//! Database methods for the faucet_claims table

use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, Result as SqliteResult};

use crate::db::Database;
use crate::models::FaucetClaimRow;

impl Database {
    pub fn get_faucet_claim(&self, wallet: &str, token: &str) -> SqliteResult<Option<FaucetClaimRow>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT wallet, token, last_claim_at FROM faucet_claims WHERE wallet = ?1 AND token = ?2",
        )?;

        let row = stmt
            .query_row([wallet, token], |row| {
                let last_claim_str: String = row.get(2)?;
                Ok(FaucetClaimRow {
                    wallet: row.get(0)?,
                    token: row.get(1)?,
                    last_claim_at: DateTime::parse_from_rfc3339(&last_claim_str)
                        .unwrap()
                        .with_timezone(&Utc),
                })
            })
            .optional()?;

        Ok(row)
    }

    /// True when no prior claim exists for (wallet, token) or the cooldown
    /// window has fully elapsed since the last claim.
    pub fn faucet_claim_eligible(
        &self,
        wallet: &str,
        token: &str,
        window_ms: i64,
        now_ms: i64,
    ) -> SqliteResult<bool> {
        match self.get_faucet_claim(wallet, token)? {
            None => Ok(true),
            Some(claim) => Ok(now_ms - claim.last_claim_at.timestamp_millis() >= window_ms),
        }
    }

    /// Record a successful grant. Exactly one row per (wallet, token);
    /// `last_claim_at` only ever advances.
    pub fn upsert_faucet_claim(&self, wallet: &str, token: &str, now: DateTime<Utc>) -> SqliteResult<()> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO faucet_claims (wallet, token, last_claim_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(wallet, token) DO UPDATE SET
                last_claim_at = MAX(last_claim_at, excluded.last_claim_at)",
            rusqlite::params![wallet, token, now.to_rfc3339()],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::db::Database;
    use chrono::Utc;

    #[test]
    fn test_cooldown_window() {
        let db = Database::new(":memory:").unwrap();
        let wallet = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";
        let window = 86_400_000;

        let now = Utc::now();
        let now_ms = now.timestamp_millis();

        // No prior claim: eligible
        assert!(db.faucet_claim_eligible(wallet, "USDT", window, now_ms).unwrap());

        db.upsert_faucet_claim(wallet, "USDT", now).unwrap();

        // Immediately after a claim: not eligible
        assert!(!db.faucet_claim_eligible(wallet, "USDT", window, now_ms + 1_000).unwrap());
        // Other token is tracked separately
        assert!(db.faucet_claim_eligible(wallet, "METH", window, now_ms).unwrap());
        // Once the window elapses: eligible again
        assert!(db.faucet_claim_eligible(wallet, "USDT", window, now_ms + window).unwrap());
    }

    #[test]
    fn test_upsert_overwrites_single_row() {
        let db = Database::new(":memory:").unwrap();
        let wallet = "0xabc";

        let first = Utc::now();
        db.upsert_faucet_claim(wallet, "USDT", first).unwrap();
        let later = first + chrono::Duration::hours(25);
        db.upsert_faucet_claim(wallet, "USDT", later).unwrap();

        let row = db.get_faucet_claim(wallet, "USDT").unwrap().unwrap();
        assert_eq!(row.last_claim_at.timestamp_millis(), later.timestamp_millis());
    }
}
