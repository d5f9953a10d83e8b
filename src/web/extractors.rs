use crate::web::state::AppState;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Gate for admin mutations: the `X-Admin-Password` header must match the
/// configured shared password. Plain string comparison; this is explicitly
/// not a real authentication system.
pub struct AdminAuth;

impl FromRequestParts<Arc<AppState>> for AdminAuth {
    type Rejection = Response;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut Parts,
        state: &'life1 Arc<AppState>,
    ) -> Pin<Box<dyn Future<Output = Result<Self, Self::Rejection>> + Send + 'async_trait>>
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        let expected = state.config.admin_password();
        let provided = parts
            .headers
            .get("x-admin-password")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        Box::pin(async move {
            match (expected, provided) {
                (Some(expected), Some(provided)) if expected == provided => Ok(AdminAuth),
                _ => Err((
                    StatusCode::UNAUTHORIZED,
                    Json(serde_json::json!({"error": "Unauthorized"})),
                )
                    .into_response()),
            }
        })
    }
}
