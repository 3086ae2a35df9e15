use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use std::net::SocketAddr;
use tower_cookies::{Cookie, Cookies};
use uuid::Uuid;

use crate::models::session::{ViewerContext, ViewerSession};
use crate::services::views;
use crate::state::AppState;

/// Name of the viewer session cookie.
pub const SESSION_COOKIE: &str = "viewer_session";

fn session_cookie(session_id: Uuid, max_age_secs: i64) -> Cookie<'static> {
    let mut cookie = Cookie::new(SESSION_COOKIE, session_id.to_string());
    cookie.set_http_only(true);
    cookie.set_same_site(tower_cookies::cookie::SameSite::Lax);
    cookie.set_max_age(tower_cookies::cookie::time::Duration::seconds(max_age_secs));
    cookie.set_path("/");
    cookie
}

/// Ensures every request carries a viewer session.
///
/// Reads the session cookie (issuing one when absent), loads the stored
/// session, derives the view-ledger identity, and injects a
/// [`ViewerContext`] for the handlers. A session store failure degrades to
/// an unverified session rather than failing the request.
pub async fn with_viewer_session(
    State(state): State<AppState>,
    cookies: Cookies,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let existing = cookies
        .get(SESSION_COOKIE)
        .and_then(|cookie| Uuid::parse_str(cookie.value()).ok());

    let (session_id, session) = match existing {
        Some(id) => {
            let session = match state.sessions.load(id).await {
                Ok(Some(session)) => session,
                Ok(None) => ViewerSession::new(Utc::now()),
                Err(e) => {
                    tracing::warn!("Session load failed for {}: {}; continuing unverified", id, e);
                    ViewerSession::new(Utc::now())
                }
            };
            (id, session)
        }
        None => {
            let id = Uuid::new_v4();
            cookies.add(session_cookie(id, state.config.session_ttl_secs() as i64));
            (id, ViewerSession::new(Utc::now()))
        }
    };

    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0);
    let client_identity = views::client_identity(request.headers(), peer);

    request.extensions_mut().insert(ViewerContext {
        session_id,
        session,
        client_identity,
    });

    next.run(request).await
}
