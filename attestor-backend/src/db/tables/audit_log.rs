//! Database methods for the audit_log table
//!
//! Append-only. Every terminal outcome of every gate protocol lands here,
//! success or failure, with the wallet when one could be determined.

use chrono::{DateTime, Utc};
use rusqlite::Result as SqliteResult;

use crate::db::Database;
use crate::models::AuditRow;

impl Database {
    pub fn record_audit(
        &self,
        event_type: &str,
        wallet: Option<&str>,
        details: &serde_json::Value,
        success: bool,
    ) -> SqliteResult<()> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO audit_log (event_type, wallet, details, success, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![
                event_type,
                wallet,
                details.to_string(),
                if success { 1 } else { 0 },
                Utc::now().to_rfc3339()
            ],
        )?;
        Ok(())
    }

    pub fn list_audit_records(&self, limit: i64) -> SqliteResult<Vec<AuditRow>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, event_type, wallet, details, success, created_at
             FROM audit_log ORDER BY id DESC LIMIT ?1",
        )?;

        let rows = stmt
            .query_map([limit], |row| {
                let created_at_str: String = row.get(5)?;
                Ok(AuditRow {
                    id: row.get(0)?,
                    event_type: row.get(1)?,
                    wallet: row.get(2)?,
                    details: row.get(3)?,
                    success: row.get::<_, i32>(4)? != 0,
                    created_at: DateTime::parse_from_rfc3339(&created_at_str)
                        .unwrap()
                        .with_timezone(&Utc),
                })
            })?
            .filter_map(|r| r.ok())
            .collect();

        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use crate::db::Database;
    use serde_json::json;

    #[test]
    fn test_record_and_list() {
        let db = Database::new(":memory:").unwrap();

        db.record_audit("sign_identity", Some("0xabc"), &json!({"commitment": "1"}), true)
            .unwrap();
        db.record_audit("faucet_claim", None, &json!({"error": "invalid_wallet"}), false)
            .unwrap();

        let rows = db.list_audit_records(10).unwrap();
        assert_eq!(rows.len(), 2);
        // Newest first
        assert_eq!(rows[0].event_type, "faucet_claim");
        assert!(!rows[0].success);
        assert!(rows[0].wallet.is_none());
        assert_eq!(rows[1].event_type, "sign_identity");
        assert!(rows[1].success);
    }
}
