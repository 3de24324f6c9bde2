/*
 * Responsibility
 * - GET /me: protected resource
 * - Reports who the verified bearer token belongs to
 */
use axum::Json;

use crate::api::v1::dto::me::MeResponse;
use crate::api::v1::extractors::AuthCtxExtractor;

pub async fn me(AuthCtxExtractor(ctx): AuthCtxExtractor) -> Json<MeResponse> {
    let principal = &ctx.principal;

    Json(MeResponse {
        client_id: ctx.client_id().to_string(),
        username: principal.username(),
        scopes: principal.scopes.iter().cloned().collect(),
        expires_at: principal.expires_at,
    })
}
