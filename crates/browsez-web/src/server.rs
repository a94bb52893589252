//! Axum server setup and router construction.

use std::net::SocketAddr;

use axum::Router;
use axum::routing::{delete, get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::api::{self, AppState};

/// Build the full axum router.
///
/// The router serves:
/// - `POST /api/messages` for user messages
/// - `DELETE /api/conversations/{id}` to forget a conversation
/// - `GET /health`
pub fn build_router(app_state: AppState) -> Router {
    // Chat surfaces relay from their own origin.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/messages", post(api::post_message))
        .route("/api/conversations/{id}", delete(api::delete_conversation))
        .route("/health", get(api::get_health))
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Bind `bind_addr`, serve `router` in the background and return the bound address.
pub async fn start_server(router: Router, bind_addr: SocketAddr) -> Result<SocketAddr, String> {
    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .map_err(|e| format!("failed to bind {bind_addr}: {e}"))?;
    let addr = listener
        .local_addr()
        .map_err(|e| format!("failed to read bound address: {e}"))?;

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router).await {
            error!("Server on {addr} stopped: {e}");
        }
    });

    Ok(addr)
}
