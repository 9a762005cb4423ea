use axum::{
    Json,
    http::{StatusCode, Uri},
    response::IntoResponse,
};
use serde_json::json;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

/// Catch-all for unmatched routes.
pub async fn not_found(uri: Uri) -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": "Page not found",
            "message": format!("The route '{uri}' does not exist"),
        })),
    )
}
