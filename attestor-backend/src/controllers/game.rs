//! Game run endpoints: raw derivation and run attestation.

use actix_web::{HttpResponse, Responder, web};
use serde_json::{Value, json};

use super::gate_error_response;
use crate::AppState;
use crate::models::SignGameRunRequest;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/game/run/raw", web::post().to(submit_raw_run))
        .route("/sign-game-run", web::post().to(sign_game_run));
}

/// Derives the canonical hash and extraction value of a raw payload and
/// records it. Never finalizes anything.
async fn submit_raw_run(state: web::Data<AppState>, body: web::Json<Value>) -> impl Responder {
    match state.gatekeeper.derive_raw_run(&body) {
        Ok(out) => HttpResponse::Ok().json(json!({
            "runHash": out.run_hash,
            "extractionValue": out.extraction_value.to_string(),
        })),
        Err(e) => gate_error_response(&e),
    }
}

async fn sign_game_run(
    state: web::Data<AppState>,
    body: web::Json<SignGameRunRequest>,
) -> impl Responder {
    match state.gatekeeper.sign_game_run(&body).await {
        Ok(out) => HttpResponse::Ok().json(json!({
            "approved": true,
            "signature": out.signature,
            "runHash": out.run_hash,
            "extractionValue": out.extraction_value,
            "identityCommitment": out.identity_commitment,
        })),
        Err(e) => gate_error_response(&e),
    }
}
