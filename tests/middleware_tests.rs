use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use chrono::{Duration, Utc};
use envio_portal::{
    AppState, create_router,
    auth::{self, Claims},
    config::AppConfig,
    models::{NewCourier, Role},
    repository::{MemoryRepository, Repository, RepositoryState},
};
use jsonwebtoken::{EncodingKey, Header, encode};
use std::sync::Arc;
use tower::ServiceExt;

// --- Test Utilities ---

/// Builds the full routing surface over an empty in-memory store. The store
/// handle is returned separately so tests can seed rows before sending
/// requests.
fn test_app() -> (axum::Router, Arc<MemoryRepository>, AppConfig) {
    let repo = Arc::new(MemoryRepository::new());
    let config = AppConfig::default();

    let state = AppState {
        repo: repo.clone() as RepositoryState,
        config: config.clone(),
    };

    (create_router(state), repo, config)
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

fn location_of(response: &axum::response::Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .expect("redirect must carry a Location header")
        .to_str()
        .unwrap()
}

/// Signs a token whose expiry is long past the validator's leeway window.
fn expired_token(config: &AppConfig) -> String {
    let now = Utc::now();
    let claims = Claims {
        sub: 1,
        role: Role::Admin,
        iat: (now - Duration::hours(2)).timestamp() as usize,
        exp: (now - Duration::hours(1)).timestamp() as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.session_secret.as_bytes()),
    )
    .unwrap()
}

// --- Unauthenticated Requests on Protected Scopes ---

#[tokio::test]
async fn admin_scope_without_token_redirects_to_login() {
    let (app, _repo, _config) = test_app();

    let response = app.oneshot(get("/admin/mensajeros", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location_of(&response), "/login");
}

#[tokio::test]
async fn courier_scope_without_token_redirects_to_login() {
    let (app, _repo, _config) = test_app();

    let response = app.oneshot(get("/mensajero/perfil", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location_of(&response), "/login");
}

#[tokio::test]
async fn garbage_token_counts_as_no_token() {
    let (app, _repo, _config) = test_app();

    let response = app
        .oneshot(get("/admin/mensajeros", Some("not.a.jwt")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location_of(&response), "/login");
}

#[tokio::test]
async fn expired_token_counts_as_no_token() {
    let (app, _repo, config) = test_app();
    let token = expired_token(&config);

    let response = app
        .oneshot(get("/admin/mensajeros", Some(&token)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location_of(&response), "/login");
}

// --- Role Mismatches on Protected Scopes ---

#[tokio::test]
async fn client_token_on_admin_scope_redirects_home() {
    let (app, _repo, config) = test_app();
    let token = auth::issue_token(1, Role::Client, &config).unwrap();

    let response = app
        .oneshot(get("/admin/mensajeros", Some(&token)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location_of(&response), "/");
}

#[tokio::test]
async fn courier_token_on_admin_scope_redirects_home() {
    let (app, _repo, config) = test_app();
    let token = auth::issue_token(2, Role::Courier, &config).unwrap();

    let response = app
        .oneshot(get("/admin/mensajeros", Some(&token)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location_of(&response), "/");
}

#[tokio::test]
async fn admin_token_on_courier_scope_redirects_home() {
    let (app, _repo, config) = test_app();
    let token = auth::issue_token(3, Role::Admin, &config).unwrap();

    let response = app
        .oneshot(get("/mensajero/perfil", Some(&token)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location_of(&response), "/");
}

// --- Matching Roles Pass Through ---

#[tokio::test]
async fn admin_token_reaches_admin_scope() {
    let (app, _repo, config) = test_app();
    let token = auth::issue_token(1, Role::Admin, &config).unwrap();

    let response = app
        .oneshot(get("/admin/mensajeros", Some(&token)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let fleet: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(fleet, serde_json::json!([]));
}

#[tokio::test]
async fn courier_token_reaches_own_profile() {
    let (app, repo, config) = test_app();

    let courier_id = repo
        .create_courier(NewCourier {
            email: "luis@envios.mx".to_string(),
            password_hash: "not-used-here".to_string(),
            name: "Luis".to_string(),
            phone: None,
            transport_type: Some("moto".to_string()),
            rate: Some(5.0),
            max_weight: Some(20.0),
        })
        .await
        .unwrap();

    let token = auth::issue_token(courier_id, Role::Courier, &config).unwrap();

    let response = app
        .oneshot(get("/mensajero/perfil", Some(&token)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let profile: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(profile["name"], "Luis");
    assert_eq!(profile["email"], "luis@envios.mx");
}

// --- Paths Outside the Scope Table ---

#[tokio::test]
async fn public_path_ignores_a_broken_token() {
    let (app, _repo, _config) = test_app();

    // Token failures are silent; a public path must not care.
    let response = app.oneshot(get("/health", Some("not.a.jwt"))).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn me_without_session_is_unauthorized_not_redirected() {
    let (app, _repo, _config) = test_app();

    // /me is outside the protected prefixes, so the middleware passes the
    // request through and the extractor produces the 401.
    let response = app.oneshot(get("/me", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"], "not authenticated");
}

#[tokio::test]
async fn me_with_session_reports_the_token_role() {
    let (app, _repo, config) = test_app();
    let token = auth::issue_token(9, Role::Admin, &config).unwrap();

    let response = app.oneshot(get("/me", Some(&token))).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["role"], "admin");
}

#[tokio::test]
async fn unknown_paths_stay_public() {
    let (app, _repo, _config) = test_app();

    // Not in the scope table, so no redirect; plain routing 404.
    let response = app.oneshot(get("/no-such-page", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn scope_prefixes_are_segment_bounded() {
    let (app, _repo, _config) = test_app();

    // A longer first segment shares the prefix bytes but is a different
    // path. It sits outside both scopes and must 404, not redirect.
    for path in ["/administrador", "/admins", "/mensajeroX", "/mensajeros"] {
        let response = app.clone().oneshot(get(path, None)).await.unwrap();
        assert_eq!(
            response.status(),
            StatusCode::NOT_FOUND,
            "{path} must fall through as public"
        );
    }
}

#[tokio::test]
async fn unmatched_paths_inside_a_scope_still_redirect() {
    let (app, _repo, _config) = test_app();

    // The scope covers the whole subtree, including routes that do not
    // exist; access control answers before routing does.
    let response = app.oneshot(get("/admin/does-not-exist", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location_of(&response), "/login");
}
