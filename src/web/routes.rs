use super::handlers;
use super::state::AppState;
use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post, put};
use axum::Router;
use std::sync::Arc;

pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/projects", get(handlers::projects::get_manifest))
        .route("/projects", post(handlers::projects::create_project))
        .route(
            "/projects/:category/:id",
            get(handlers::projects::get_project),
        )
        .route(
            "/projects/:category/:id",
            put(handlers::projects::update_project),
        )
        .route(
            "/projects/:category/:id",
            delete(handlers::projects::delete_project),
        )
        .route(
            "/projects/:category/:id/upload-urls",
            post(handlers::projects::upload_urls),
        )
}

pub fn storage_routes(max_upload_bytes: usize) -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/uploads/*key",
            put(handlers::uploads::put_object).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route("/media/*key", get(handlers::uploads::serve_media))
}
