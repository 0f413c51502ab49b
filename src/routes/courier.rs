use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Courier Router Module
///
/// Courier self-service, nested under `/mensajero`. The access middleware
/// requires a `courier` token for this prefix; the profile handler
/// additionally rejects any non-courier session it is handed.
pub fn courier_routes() -> Router<AppState> {
    Router::new()
        // GET /mensajero/perfil
        // The courier's own profile, looked up by the id in the session
        // token. 404 when the profile row is gone.
        .route("/perfil", get(handlers::courier_profile))
}
