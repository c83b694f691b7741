//! Router assembly.
//!
//! Kept in the library so the binary and the integration tests serve the
//! exact same stack.

use axum::{Router, body::Body, middleware::from_fn, middleware::from_fn_with_state, routing::get};
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::middleware::{
    SecurityPolicy, SessionLocks, create_session_layer, csp_nonce_middleware, make_request_span,
    request_id_middleware, security_headers_middleware, session_lock_middleware,
};
use crate::routes;
use crate::state::AppState;

/// Build the storefront router with its full middleware stack.
///
/// Serve it with `into_make_service_with_connect_info::<SocketAddr>()` so the
/// rate limiters can fall back to the peer address.
pub fn build_router(state: AppState) -> Router {
    let config = state.config();
    let session_layer = create_session_layer(config);
    let policy = SecurityPolicy::new(&config.map, state.catalog().image_origins());
    let static_files = ServeDir::new(&config.static_dir);

    Router::new()
        .route("/health", get(health))
        .merge(routes::routes())
        .nest_service("/static", static_files)
        .layer(session_layer)
        .layer(from_fn_with_state(SessionLocks::new(), session_lock_middleware))
        .layer(from_fn_with_state(policy, security_headers_middleware))
        .layer(from_fn(csp_nonce_middleware))
        .layer(from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span::<Body>))
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. There are no dependencies to check.
async fn health() -> &'static str {
    "ok"
}
