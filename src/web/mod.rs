mod extractors;
mod handlers;
mod routes;
mod state;

pub use state::AppState;

use crate::{Config, Store};
use anyhow::Result;
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Build the full application router: the projects API plus the storage
/// surface (presigned upload target and public media serving). CORS is wide
/// open, matching the browser dashboard this API fronts.
pub fn app(config: Config, store: Store) -> Router {
    let max_upload_bytes = config.upload.max_size_bytes;
    let state = Arc::new(AppState::new(config, store));

    Router::new()
        .merge(routes::api_routes())
        .merge(routes::storage_routes(max_upload_bytes))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(config: Config, store: Store, addr: &str) -> Result<()> {
    let router = app(config, store);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;
    Ok(())
}
