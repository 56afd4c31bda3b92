use actix_web::{HttpResponse, Responder, web};
use serde_json::json;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health));
}

async fn health() -> impl Responder {
    HttpResponse::Ok().json(json!({ "ok": true }))
}
