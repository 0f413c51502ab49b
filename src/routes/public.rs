use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints reachable without a session: the liveness check and the two
/// entry points of the identity flow. Everything else in the application
/// sits behind the access middleware's scope table; these paths classify as
/// public and always pass through it.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Unauthenticated endpoint for monitoring and load balancer checks.
        .route("/health", get(handlers::health))
        // POST /register
        // Self-service client registration: identity + client profile in
        // one transaction, role fixed to `client`.
        .route("/register", post(handlers::register_user))
        // POST /auth/login
        // Credential sign-in. Issues the Bearer token every protected route
        // expects; the only place tokens are created.
        .route("/auth/login", post(handlers::login))
}
