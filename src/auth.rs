use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header, request::Parts},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::{config::AppConfig, error::ApiError, models::Role};

/// Claims
///
/// The payload signed into every session token. Validated on every request
/// that presents one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): the identity id from the `users` table.
    pub sub: i64,
    /// The account role at issue time. Roles are immutable in this flow, so
    /// the claim stays authoritative for the token's lifetime.
    pub role: Role,
    /// Issued At (iat): timestamp when the token was created.
    pub iat: usize,
    /// Expiration Time (exp): timestamp after which the token must not be
    /// accepted.
    pub exp: usize,
}

/// AuthUser
///
/// The resolved identity of an authenticated request: what the access
/// middleware decoded from the session token. Handlers take this as an
/// argument and must not re-derive id or role from anything the caller
/// sent outside the token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub id: i64,
    pub role: Role,
}

/// Role required for each protected path prefix. This table is the single
/// source of truth for scope authorization and is consulted only by
/// `access_middleware`; everything outside these prefixes is public.
pub const PROTECTED_SCOPES: &[(&str, Role)] = &[
    ("/admin", Role::Admin),
    ("/mensajero", Role::Courier),
];

/// Classify a request path against the scope table. Prefixes match on
/// segment boundaries: `/admin` covers `/admin` and `/admin/...`, never a
/// longer first segment such as `/administrador`. `None` means public.
pub fn required_role(path: &str) -> Option<Role> {
    PROTECTED_SCOPES
        .iter()
        .find(|(prefix, _)| {
            path.strip_prefix(prefix)
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
        })
        .map(|(_, role)| *role)
}

/// Sign a session token for a freshly authorized identity.
pub fn issue_token(
    user_id: i64,
    role: Role,
    config: &AppConfig,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id,
        role,
        iat: now.timestamp() as usize,
        exp: (now + Duration::hours(config.token_ttl_hours)).timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.session_secret.as_bytes()),
    )
}

/// Decode and validate a session token.
///
/// Missing signature match, malformed payload, unknown role string, and
/// expiry all collapse to `None`; the caller treats every failure as
/// "no token" and never sees the reason.
pub fn decode_token(token: &str, secret: &str) -> Option<Claims> {
    let decoding_key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::default();
    validation.validate_exp = true;

    decode::<Claims>(token, &decoding_key, &validation)
        .map(|data| data.claims)
        .ok()
}

/// Pull the raw token out of the `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// Access middleware: the only authorization enforcement point.
///
/// Runs once per inbound request, before any handler:
/// 1. Decode the bearer token, silently treating any failure as "no token".
/// 2. On success, store the decoded identity in request extensions so
///    handlers can take [`AuthUser`] as an argument.
/// 3. Classify the path against [`PROTECTED_SCOPES`] and apply the
///    transition table: no token on a protected path redirects to the login
///    page, a role mismatch redirects home, everything else passes through.
pub async fn access_middleware(
    State(config): State<AppConfig>,
    mut request: Request,
    next: Next,
) -> Response {
    let session = bearer_token(request.headers())
        .and_then(|token| decode_token(token, &config.session_secret));

    if let Some(claims) = &session {
        request.extensions_mut().insert(AuthUser {
            id: claims.sub,
            role: claims.role,
        });
    }

    if let Some(required) = required_role(request.uri().path()) {
        match &session {
            None => {
                tracing::debug!(
                    "Unauthenticated request to {}, redirecting to login",
                    request.uri().path()
                );
                return Redirect::temporary("/login").into_response();
            }
            Some(claims) if claims.role != required => {
                tracing::debug!(
                    "Role {} lacks access to {}, redirecting home",
                    claims.role,
                    request.uri().path()
                );
                return Redirect::temporary("/").into_response();
            }
            Some(_) => {}
        }
    }

    next.run(request).await
}

/// AuthUser Extractor Implementation
///
/// Lets any handler take `AuthUser` as an argument. The value comes from
/// request extensions, placed there by [`access_middleware`] when the token
/// decoded; the extractor itself never touches the token or the database.
/// Rejection: 401 with the standard error body when no session was decoded.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .copied()
            .ok_or(ApiError::Unauthorized)
    }
}
