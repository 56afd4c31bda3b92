pub mod faucet;
pub mod game;
pub mod health;
pub mod identity;

use actix_web::HttpResponse;
use serde_json::json;

use crate::gatekeeper::GateError;

/// Render a gate error as its wire response. Only the fixed tag crosses the
/// boundary; full detail stays in the server log and audit trail.
pub(crate) fn gate_error_response(err: &GateError) -> HttpResponse {
    if matches!(err, GateError::External(_) | GateError::Internal(_)) {
        log::error!("[controllers] request failed: {}", err);
    }

    let mut body = json!({ "error": err.code() });
    if let GateError::RateLimited { retry_after_ms } = err {
        body["retryAfterMs"] = json!(retry_after_ms);
    }

    HttpResponse::build(err.status()).json(body)
}
