use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints reachable without credentials: the health probe and account registration.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness check for load balancers; never touches the store.
        .route("/health", get(|| async { "ok" }))
        // POST /registeruser
        // Creates an account. Every other mutating endpoint needs one.
        .route("/registeruser", post(handlers::register_user))
}
