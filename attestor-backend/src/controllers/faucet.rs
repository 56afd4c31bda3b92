//! Faucet endpoint. Rate limiting for this endpoint is keyed by source IP,
//! not wallet, so claims for many wallets from one host still share a budget.

use actix_web::{HttpRequest, HttpResponse, Responder, web};
use serde_json::json;

use super::gate_error_response;
use crate::AppState;
use crate::models::FaucetRequest;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/faucet", web::post().to(claim));
}

async fn claim(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<FaucetRequest>,
) -> impl Responder {
    let source_ip = req
        .connection_info()
        .realip_remote_addr()
        .unwrap_or("unknown")
        .to_string();

    match state.gatekeeper.claim_faucet(&body, &source_ip).await {
        Ok(out) => HttpResponse::Ok().json(json!({
            "txHash": out.tx_hash,
            "amount": out.amount,
            "balance": out.balance,
            "blockNumber": out.block_number,
        })),
        Err(e) => gate_error_response(&e),
    }
}
