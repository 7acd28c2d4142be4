use actix_web::{get, HttpResponse};
use chrono::Utc;

#[get("/")]
pub async fn root() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "message": "Welcome to the test bank generation API. See /health and /api/v1/titles/ to get started."
    }))
}

#[get("/health")]
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION")
    }))
}
