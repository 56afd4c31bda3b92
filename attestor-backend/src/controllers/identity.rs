//! Identity endpoints: attestation requests and the public identity snapshot.

use actix_web::{HttpResponse, Responder, web};
use serde_json::json;

use super::gate_error_response;
use crate::AppState;
use crate::gatekeeper::Gatekeeper;
use crate::models::SignIdentityRequest;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/sign-identity", web::post().to(sign_identity))
        .route("/user/{wallet}", web::get().to(get_user));
}

async fn sign_identity(
    state: web::Data<AppState>,
    body: web::Json<SignIdentityRequest>,
) -> impl Responder {
    match state.gatekeeper.sign_identity(&body).await {
        Ok(out) => HttpResponse::Ok().json(json!({ "signature": out.signature })),
        Err(e) => gate_error_response(&e),
    }
}

async fn get_user(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let (_, wallet) = match Gatekeeper::normalize_wallet(&path) {
        Ok(pair) => pair,
        Err(e) => return gate_error_response(&e),
    };

    match state.db.get_identity(&wallet) {
        Ok(Some(row)) => HttpResponse::Ok().json(json!({
            "wallet": row.wallet,
            "commitment": row.commitment,
            "verified": row.verified,
            "lastVerificationRequestAt": row.last_verification_request_at,
            "createdAt": row.created_at,
            "updatedAt": row.updated_at,
        })),
        Ok(None) => HttpResponse::NotFound().json(json!({ "error": "not_found" })),
        Err(e) => {
            log::error!("[identity] snapshot lookup failed: {}", e);
            HttpResponse::InternalServerError().json(json!({ "error": "internal_error" }))
        }
    }
}
