pub mod projects;
pub mod uploads;

use axum::response::{IntoResponse, Json, Response};

pub async fn health() -> Response {
    Json(serde_json::json!({"status": "ok"})).into_response()
}
