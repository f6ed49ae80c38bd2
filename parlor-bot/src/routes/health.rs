use axum::Json;
use parlor_shared::types::api::HealthResponse;

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse::healthy("parlor-bot", env!("CARGO_PKG_VERSION")))
}
