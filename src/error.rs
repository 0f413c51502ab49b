use axum::{
    Json,
    extract::{FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;
use serde_json::json;
use thiserror::Error;

/// ApiError
///
/// The single error type every handler and repository method returns. Each
/// variant owns its HTTP status; `IntoResponse` renders the uniform
/// `{"error": message}` body. Server-side failures (`Persistence`,
/// `Internal`) are logged with their cause and reach the client only as a
/// generic 500 message.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or malformed input, rejected before any write.
    #[error("{0}")]
    Validation(String),

    /// A case-insensitive email match already exists.
    #[error("email is already registered")]
    DuplicateEmail,

    /// Unknown email or wrong password. One variant and one message for
    /// both causes, so responses never reveal which factor failed.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// No usable session on an endpoint that requires one.
    #[error("not authenticated")]
    Unauthorized,

    #[error("{0} not found")]
    NotFound(&'static str),

    /// Unexpected store failure. Any transaction in flight has already
    /// rolled back by the time this surfaces.
    #[error("database failure: {0}")]
    Persistence(#[from] sqlx::Error),

    /// Hashing or token-signing failure.
    #[error("{0}")]
    Internal(String),
}

impl From<bcrypt::BcryptError> for ApiError {
    fn from(err: bcrypt::BcryptError) -> Self {
        ApiError::Internal(format!("password hashing failed: {err}"))
    }
}

impl From<jsonwebtoken::errors::Error> for ApiError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        ApiError::Internal(format!("token signing failed: {err}"))
    }
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::DuplicateEmail => StatusCode::BAD_REQUEST,
            ApiError::InvalidCredentials | ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Persistence(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let message = match &self {
            ApiError::Persistence(err) => {
                tracing::error!("Database failure: {err}");
                "internal server error".to_string()
            }
            ApiError::Internal(msg) => {
                tracing::error!("Internal failure: {msg}");
                "internal server error".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// JsonBody
///
/// Request-body extractor wrapping axum's `Json`. Axum rejects an absent
/// field, a null, a wrong type, or unparseable JSON with its own 422 before
/// a handler ever runs; this wrapper folds that rejection into
/// [`ApiError::Validation`], so every malformed body comes back as the
/// standard 400 with the deserializer's field-level message in the error
/// body. Field presence ends here; emptiness checks stay in the handlers.
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::Validation(rejection.body_text()))?;

        Ok(Self(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_match_taxonomy() {
        assert_eq!(
            ApiError::Validation("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::DuplicateEmail.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::InvalidCredentials.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(ApiError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ApiError::NotFound("courier").status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Internal("boom".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn credential_failures_share_one_message() {
        // Unknown email and wrong password must be indistinguishable.
        assert_eq!(
            ApiError::InvalidCredentials.to_string(),
            "invalid credentials"
        );
    }
}
