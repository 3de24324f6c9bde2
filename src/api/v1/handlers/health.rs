/*
 * Responsibility
 * - GET /health (liveness)
 * - Never needs a principal; anonymous requests pass the bearer middleware
 */
use axum::{Json, http::StatusCode, response::IntoResponse};
use serde_json::json;

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({"status": "ok"})))
}
