use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use ts_rs::TS;
use utoipa::ToSchema;

// --- Core Application Schemas (Mapped to Database) ---

/// Role
///
/// The closed set of account roles. Stored as lowercase `TEXT` in the `users`
/// table and carried as a lowercase string in JSON bodies and token claims.
/// Decoding any other string fails, so an invalid role is unrepresentable
/// past the serialization boundary.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, TS, ToSchema, Default,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
#[ts(export)]
pub enum Role {
    Admin,
    Courier,
    #[default]
    Client,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Courier => "courier",
            Role::Client => "client",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User
///
/// Canonical identity record from the `users` table: one row per
/// login-capable account. Internal only; never serialized to clients, since
/// it carries the password hash.
#[derive(Debug, Clone, FromRow, Default)]
pub struct User {
    pub id: i64,
    pub email: String,

    /// Maps SQL column "password" (which stores the bcrypt hash) to a field
    /// name that says what the value actually is.
    #[sqlx(rename = "password")]
    pub password_hash: String,

    pub role: Role,
}

/// CourierRecord
///
/// One row of the admin courier listing: the courier profile joined with the
/// identity email. `id` is the identity id (`couriers.user_id` aliased in
/// the query), which is also the id used for update and delete.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct CourierRecord {
    pub id: i64,
    pub name: String,
    pub phone: Option<String>,
    pub transport_type: Option<String>,
    pub is_available: bool,
    pub email: String,
}

/// CourierProfile
///
/// The courier's own view of their profile (GET /mensajero/perfil),
/// including the commercial fields the admin listing omits.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct CourierProfile {
    pub name: String,
    pub phone: Option<String>,
    pub transport_type: Option<String>,
    pub rate: Option<f64>,
    pub max_weight: Option<f64>,
    pub email: String,
}

// --- Request Payloads (Input Schemas) ---

/// RegisterRequest
///
/// Input payload for public client registration (POST /register).
/// The password is hashed before it reaches the repository and is never
/// persisted or logged in plaintext.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct RegisterRequest {
    pub name: String,
    pub phone: Option<String>,
    pub email: String,
    pub password: String,
}

/// LoginRequest
///
/// Input payload for credential sign-in (POST /auth/login).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// CreateCourierRequest
///
/// Input payload for the admin courier-creation endpoint
/// (POST /admin/crear-mensajero). Credentials plus the initial profile
/// fields; availability is not accepted here, it defaults to true.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateCourierRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    pub phone: Option<String>,
    pub transport_type: Option<String>,
    pub rate: Option<f64>,
    pub max_weight: Option<f64>,
}

/// UpdateCourierRequest
///
/// Partial update payload for a courier profile (PUT /admin/mensajeros/{id}).
/// All fields optional; omitted fields keep their current value via
/// `COALESCE` in the update statement, including `is_available`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateCourierRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub transport_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_weight: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_available: Option<bool>,
}

// --- Write Models (Repository Input) ---

/// NewClient
///
/// Write model for the registration transaction: identity columns plus the
/// client profile fields, with the password already hashed. Plaintext
/// passwords never cross the repository boundary.
#[derive(Debug, Clone, Default)]
pub struct NewClient {
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub phone: Option<String>,
}

/// NewCourier
///
/// Write model for the courier-creation transaction. Availability is not a
/// field here; new couriers always start available.
#[derive(Debug, Clone, Default)]
pub struct NewCourier {
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub phone: Option<String>,
    pub transport_type: Option<String>,
    pub rate: Option<f64>,
    pub max_weight: Option<f64>,
}

// --- Response Schemas (Output) ---

/// MessageResponse
///
/// Uniform `{message}` acknowledgement for write endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct MessageResponse {
    pub message: String,
}

/// LoginResponse
///
/// Output of a successful sign-in: the signed session token plus how to use
/// it and how long it lasts.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct LoginResponse {
    pub token: String,
    /// Always "Bearer"; clients send the token in the Authorization header.
    pub token_type: String,
    /// Token lifetime in seconds.
    pub expires_in: i64,
    pub role: Role,
}

/// SessionInfo
///
/// Output schema for the session check (GET /me): the role decoded from the
/// caller's token.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct SessionInfo {
    pub role: Role,
}
