use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub client_id: String,
    pub username: Option<String>,
    // sorted
    pub scopes: Vec<String>,
    pub expires_at: Option<i64>,
}
