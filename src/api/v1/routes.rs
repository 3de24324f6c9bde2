/*
 * Responsibility
 * - URL structure of v1
 * - Which routes need a principal is decided per handler (AuthCtxExtractor)
 */
use axum::{Router, routing::get};

use crate::state::AppState;

use crate::api::v1::handlers::{health::health, me::me};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/me", get(me))
}
