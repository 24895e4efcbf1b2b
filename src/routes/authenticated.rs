use crate::{AppState, handlers};
use axum::{Router, routing::post};

/// Authenticated Router Module
///
/// Every handler here extracts `Authorized<T>`: the JSON body carries `username` and
/// `password`, and a request whose credentials fail the gate is answered with 401 before
/// the handler body runs. All endpoints are POST with a JSON body.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // --- Users ---
        .route("/updateuser", post(handlers::update_user))
        .route("/deleteuser", post(handlers::delete_user))
        // --- Authors ---
        .route("/registerauthor", post(handlers::register_author))
        // Rename cascades to every article carrying the old author name.
        .route("/updateauthor", post(handlers::update_author))
        .route("/deleteauthor", post(handlers::delete_author))
        // --- News ---
        .route("/registernews", post(handlers::register_news))
        .route("/updatenews", post(handlers::update_news))
        .route("/deletenews", post(handlers::delete_news))
        // Search is read-only but still gated.
        .route("/shownews", post(handlers::show_news))
}
