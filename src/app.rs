use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower_cookies::CookieManagerLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware_layer;
use crate::state::AppState;

/// Builds the API router.
///
/// Rate limiting and CORS are layered on in `main`; tests drive this
/// router directly with in-memory state.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/pastes", post(handlers::pastes::create_paste))
        .route(
            "/api/pastes/{paste_id}",
            get(handlers::pastes::read_paste)
                .patch(handlers::pastes::update_paste)
                .delete(handlers::pastes::delete_paste),
        )
        .route(
            "/api/pastes/{paste_id}/download",
            get(handlers::pastes::download_paste),
        )
        .route(
            "/api/pastes/{paste_id}/password",
            post(handlers::pastes::verify_password),
        )
        .route_layer(from_fn_with_state(
            state.clone(),
            middleware_layer::session::with_viewer_session,
        ))
        .layer(CookieManagerLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
