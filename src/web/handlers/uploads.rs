use crate::services::presign;
use crate::web::state::AppState;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Deserialize)]
pub struct PresignQuery {
    pub expires: i64,
    pub signature: String,
}

/// PUT /uploads/*key — the presigned upload target. The signature binds
/// method, key, and expiry; anything else is a 403.
pub async fn put_object(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
    Query(query): Query<PresignQuery>,
    body: Bytes,
) -> Response {
    if crate::store::validate_key(&key).is_err() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": "Invalid object key"})),
        )
            .into_response();
    }

    if !presign::verify(
        &state.config.auth.upload_signing_key,
        "PUT",
        &key,
        query.expires,
        &query.signature,
    ) {
        return (
            StatusCode::FORBIDDEN,
            Json(serde_json::json!({"error": "Invalid or expired upload signature"})),
        )
            .into_response();
    }

    if body.len() > state.config.upload.max_size_bytes {
        return (
            StatusCode::PAYLOAD_TOO_LARGE,
            Json(serde_json::json!({"error": "Upload exceeds the size limit"})),
        )
            .into_response();
    }

    match state.store.put(&key, &body) {
        Ok(()) => {
            tracing::info!("Stored upload {} ({} bytes)", key, body.len());
            Json(serde_json::json!({"message": "Uploaded", "key": key})).into_response()
        }
        Err(e) => {
            tracing::error!("Failed to store upload '{}': {:?}", key, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": "Internal server error"})),
            )
                .into_response()
        }
    }
}

/// GET /media/*key — serve a stored object. This is the storage base that
/// relative media references resolve against.
pub async fn serve_media(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> Response {
    if crate::store::validate_key(&key).is_err() {
        return (StatusCode::NOT_FOUND, "Not Found").into_response();
    }
    match state.store.get(&key) {
        Ok(Some(data)) => {
            let mime = mime_guess::from_path(&key).first_or_octet_stream();
            ([(header::CONTENT_TYPE, mime.to_string())], data).into_response()
        }
        Ok(None) => (StatusCode::NOT_FOUND, "Not Found").into_response(),
        Err(e) => {
            tracing::error!("Failed to read object '{}': {:?}", key, e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
        }
    }
}
