use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post, put},
};

/// Admin Router Module
///
/// Courier fleet management, nested under `/admin`. The access middleware
/// has already required an `admin` token for this prefix before any handler
/// here runs; handlers take the decoded session and do not re-check role.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // POST /admin/crear-mensajero
        // Creates a courier account: `courier` identity plus profile row in
        // one transaction. Duplicate email is a 400.
        .route("/crear-mensajero", post(handlers::create_courier))
        // GET /admin/mensajeros
        // The whole fleet joined with identity emails, for the dashboard
        // table.
        .route("/mensajeros", get(handlers::list_couriers))
        // PUT/DELETE /admin/mensajeros/{id}
        // Partial profile update (COALESCE semantics, 404 on unknown id)
        // and identity delete (cascades to the profile, idempotent).
        .route(
            "/mensajeros/{id}",
            put(handlers::update_courier).delete(handlers::delete_courier),
        )
}
