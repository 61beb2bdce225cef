//! Read-only REST API over a populated reading store.
//!
//! Provides three GET endpoints:
//! - `/summary`: totals and anomaly gauge for a filtered series
//! - `/series`: derived consumption points for a filtered series
//! - `/forecast/{meter_id}`: linear-trend forecast for one meter

mod handlers;
mod types;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::get;

use crate::store::ReadingStore;

/// Immutable application state shared across all request handlers.
///
/// The store is fully materialized before serving and wrapped in `Arc`;
/// no locks are needed since all endpoints are read-only.
pub struct AppState {
    /// Populated reading store.
    pub store: ReadingStore,
}

/// Builds the axum router with all API routes.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/summary", get(handlers::get_summary))
        .route("/series", get(handlers::get_series))
        .route("/forecast/{meter_id}", get(handlers::get_forecast))
        .with_state(state)
}

/// Binds to the given address and serves the API.
///
/// # Panics
///
/// Panics if the TCP listener cannot bind to `addr`.
pub async fn serve(state: Arc<AppState>, addr: SocketAddr) {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind to {addr}: {e}"));
    eprintln!("API server listening on http://{addr}");
    axum::serve(listener, app)
        .await
        .unwrap_or_else(|e| panic!("server error: {e}"));
}
