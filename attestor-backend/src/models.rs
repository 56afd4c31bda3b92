use chrono::{DateTime, Utc};
use serde::Deserialize;

// ---------------------------------------------------------------------------
// Rows
// ---------------------------------------------------------------------------

/// One row per wallet. `commitment` is stored as a normalized decimal string.
#[derive(Debug, Clone)]
pub struct IdentityRow {
    pub wallet: String,
    pub commitment: String,
    pub verified: bool,
    pub last_verification_request_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Finalized run. `run_hash` is the primary key; rows are immutable.
#[derive(Debug, Clone)]
pub struct RunRow {
    pub run_hash: String,
    pub wallet: String,
    pub extraction_value: String,
    pub identity_commitment: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct FaucetClaimRow {
    pub wallet: String,
    pub token: String,
    pub last_claim_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct AuditRow {
    pub id: i64,
    pub event_type: String,
    pub wallet: Option<String>,
    pub details: String,
    pub success: bool,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Request DTOs
//
// All uint256 values cross the HTTP boundary as decimal strings; run hashes
// as 0x-prefixed 64-hex-character strings.
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct SignIdentityRequest {
    pub wallet: String,
    pub commitment: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignGameRunRequest {
    pub wallet: String,
    pub run_hash: String,
    pub extraction_value: String,
    pub identity_commitment: String,
    /// Optional raw payload; when present its derived hash and value must
    /// match the claimed ones exactly.
    pub raw: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct FaucetRequest {
    pub wallet: String,
    /// Token symbol, defaults to USDT.
    pub token: Option<String>,
}
