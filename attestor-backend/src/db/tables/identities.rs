//! Database methods for the identities table

use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, Result as SqliteResult};

use crate::db::Database;
use crate::models::IdentityRow;

impl Database {
    pub fn get_identity(&self, wallet: &str) -> SqliteResult<Option<IdentityRow>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT wallet, commitment, verified, last_verification_request_at, created_at, updated_at
             FROM identities WHERE wallet = ?1",
        )?;

        let row = stmt
            .query_row([wallet], |row| {
                let last_req: Option<String> = row.get(3)?;
                let created_at_str: String = row.get(4)?;
                let updated_at_str: String = row.get(5)?;

                Ok(IdentityRow {
                    wallet: row.get(0)?,
                    commitment: row.get(1)?,
                    verified: row.get::<_, i32>(2)? != 0,
                    last_verification_request_at: last_req.map(|s| {
                        DateTime::parse_from_rfc3339(&s).unwrap().with_timezone(&Utc)
                    }),
                    created_at: DateTime::parse_from_rfc3339(&created_at_str)
                        .unwrap()
                        .with_timezone(&Utc),
                    updated_at: DateTime::parse_from_rfc3339(&updated_at_str)
                        .unwrap()
                        .with_timezone(&Utc),
                })
            })
            .optional()?;

        Ok(row)
    }

    /// Upsert the commitment for a wallet and stamp the verification request.
    /// The caller enforces the immutability rules (verified rows and
    /// differing commitments are rejected before this is reached).
    pub fn upsert_identity_commitment(
        &self,
        wallet: &str,
        commitment: &str,
        now: DateTime<Utc>,
    ) -> SqliteResult<()> {
        let conn = self.conn();
        let now_str = now.to_rfc3339();
        conn.execute(
            "INSERT INTO identities (wallet, commitment, verified, last_verification_request_at, created_at, updated_at)
             VALUES (?1, ?2, 0, ?3, ?3, ?3)
             ON CONFLICT(wallet) DO UPDATE SET
                commitment = excluded.commitment,
                last_verification_request_at = excluded.last_verification_request_at,
                updated_at = excluded.updated_at",
            rusqlite::params![wallet, commitment, &now_str],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::db::Database;
    use chrono::Utc;

    #[test]
    fn test_identity_upsert_and_get() {
        let db = Database::new(":memory:").unwrap();
        let wallet = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

        assert!(db.get_identity(wallet).unwrap().is_none());

        let now = Utc::now();
        db.upsert_identity_commitment(wallet, "12345", now).unwrap();

        let row = db.get_identity(wallet).unwrap().unwrap();
        assert_eq!(row.wallet, wallet);
        assert_eq!(row.commitment, "12345");
        assert!(!row.verified);
        assert!(row.last_verification_request_at.is_some());

        // Re-upsert updates the commitment in place, one row per wallet
        db.upsert_identity_commitment(wallet, "67890", Utc::now()).unwrap();
        let row = db.get_identity(wallet).unwrap().unwrap();
        assert_eq!(row.commitment, "67890");
    }
}
