//! Aurelia Storefront library.
//!
//! The storefront API and the indexed entity store it runs on, exposed as a
//! library so the binary, the CLI and the integration tests share one
//! router.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod seed;
pub mod services;
pub mod state;

use std::future::Future;

use axum::{Router, extract::Request};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use state::AppState;

/// Build the full application router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(routes::routes(state.clone()))
        .with_state(state)
        .layer(axum::middleware::from_fn(
            middleware::request_id_middleware,
        ))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request| {
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = tracing::field::Empty,
                )
            }),
        )
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

/// Serve the application on `listener` until `shutdown` resolves.
///
/// # Errors
///
/// Returns an I/O error if the server fails.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown)
        .await
}
