//! Gate decision error taxonomy.
//!
//! Every protocol step returns a tagged outcome; the first failing check
//! short-circuits the rest. Client-facing bodies carry only the fixed tag
//! from `code()` - internal detail goes to the audit log and server log.

use actix_web::http::StatusCode;
use std::fmt;

#[derive(Debug)]
pub enum GateError {
    /// Malformed or out-of-range input; the tag is the wire error code.
    Validation(&'static str),
    /// State already satisfies or contradicts the request
    /// (already_verified, commitment_mismatch, duplicate_run).
    Conflict(&'static str),
    /// Fixed-window limit exceeded; retryable by the client.
    RateLimited { retry_after_ms: i64 },
    /// Faucet cooldown still active for this (wallet, token).
    CooldownActive,
    /// The identity-verification oracle explicitly denied the wallet.
    NotVerified,
    /// No minting actor configured (operator fault).
    FaucetNotConfigured,
    /// Token unknown or missing a contract address.
    TokenNotConfigured,
    /// Oracle or minting actor call failed or timed out.
    External(String),
    Internal(String),
}

impl GateError {
    /// Fixed machine-readable tag sent to clients.
    pub fn code(&self) -> &str {
        match self {
            GateError::Validation(tag) => tag,
            GateError::Conflict(tag) => tag,
            GateError::RateLimited { .. } => "rate_limited",
            GateError::CooldownActive => "already_claimed",
            GateError::NotVerified => "identity_not_verified",
            GateError::FaucetNotConfigured => "faucet_not_configured",
            GateError::TokenNotConfigured => "token_not_configured",
            GateError::External(_) | GateError::Internal(_) => "internal_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            GateError::Validation(_) => StatusCode::BAD_REQUEST,
            // commitment_mismatch is a conflict by taxonomy but crosses the
            // wire as 400; the other conflicts are 409.
            GateError::Conflict("commitment_mismatch") => StatusCode::BAD_REQUEST,
            GateError::Conflict(_) => StatusCode::CONFLICT,
            GateError::RateLimited { .. } | GateError::CooldownActive => {
                StatusCode::TOO_MANY_REQUESTS
            }
            GateError::NotVerified => StatusCode::FORBIDDEN,
            GateError::TokenNotConfigured => StatusCode::BAD_REQUEST,
            GateError::FaucetNotConfigured
            | GateError::External(_)
            | GateError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Full detail for the audit record. Never sent to clients.
    pub fn audit_detail(&self) -> String {
        match self {
            GateError::RateLimited { retry_after_ms } => {
                format!("rate_limited (retry after {}ms)", retry_after_ms)
            }
            GateError::External(detail) => format!("external dependency: {}", detail),
            GateError::Internal(detail) => format!("internal: {}", detail),
            other => other.code().to_string(),
        }
    }
}

impl fmt::Display for GateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.audit_detail())
    }
}
