use axum::{http::StatusCode, Json, response::IntoResponse};
use serde::Serialize;
use serde_json::json;

#[derive(Serialize)]
pub struct ApiInfo {
    pub name: String,
    pub version: String,
    pub description: String,
    pub status: String,
    pub pricing: String,
}

const PRICING_NOTE: &str =
    "Course prices are integer cents in price_cents (5000 = 50.00); price repeats the amount as a decimal string";

pub async fn root() -> impl IntoResponse {
    Json(json!({
        "name": "Aula API",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Course enrollment and payment voucher approval",
        "status": "operational",
        "endpoints": {
            "health": "/health",
            "api": "/api",
            "auth": "/auth/login",
            "courses": "/api/courses",
            "vouchers": "/api/vouchers"
        }
    }))
}

pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    })))
}

pub async fn api_info() -> impl IntoResponse {
    Json(ApiInfo {
        name: "Aula API".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        description: "Course enrollment and payment voucher approval".to_string(),
        status: "operational".to_string(),
        pricing: PRICING_NOTE.to_string(),
    })
}
