use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Authenticated Router Module
///
/// Routes that require a decoded session but no specific role. The path
/// lives outside the protected prefixes, so the access middleware lets the
/// request through either way; the `AuthUser` extractor is what turns a
/// missing session into a 401 here.
pub fn authenticated_routes() -> Router<AppState> {
    Router::new()
        // GET /me
        // Session check: echoes the role from the caller's token. The
        // dashboard uses it to pick which navigation to render.
        .route("/me", get(handlers::get_me))
}
