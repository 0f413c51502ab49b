use crate::{
    AppState,
    auth::{self, AuthUser},
    error::{ApiError, JsonBody},
    models::{
        CourierProfile, CourierRecord, CreateCourierRequest, LoginRequest, LoginResponse,
        MessageResponse, NewClient, NewCourier, RegisterRequest, Role, SessionInfo,
        UpdateCourierRequest,
    },
    password,
};
use axum::{
    Json,
    extract::{Path, State},
};

// --- Validation Helpers ---

/// Rejects empty (or whitespace-only) required fields before any hashing or
/// database work happens, naming every missing field in one message.
fn require_fields(fields: &[(&str, &str)]) -> Result<(), ApiError> {
    let missing: Vec<&str> = fields
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| *name)
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ApiError::Validation(format!(
            "missing required fields: {}",
            missing.join(", ")
        )))
    }
}

// --- Handlers ---

/// health
///
/// [Public Route] Liveness check; no auth, no database.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up"))
)]
pub async fn health() -> &'static str {
    "OK"
}

/// register_user
///
/// [Public Route] Self-service client registration.
///
/// *Flow*: validate required fields → duplicate fast-path check → hash the
/// password → insert identity + client profile in one transaction. The
/// fast-path check only improves the error message under no contention; the
/// unique index on LOWER(email) is what actually guarantees uniqueness, and
/// a conflicting concurrent insert still comes back as the same 400.
#[utoipa::path(
    post,
    path = "/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Registered", body = MessageResponse),
        (status = 400, description = "Missing fields or duplicate email")
    )
)]
pub async fn register_user(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<RegisterRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    require_fields(&[
        ("name", &payload.name),
        ("email", &payload.email),
        ("password", &payload.password),
    ])?;

    if state.repo.email_taken(&payload.email).await? {
        return Err(ApiError::DuplicateEmail);
    }

    let password_hash = password::hash_password(&payload.password)?;

    let user_id = state
        .repo
        .register_client(NewClient {
            email: payload.email,
            password_hash,
            name: payload.name,
            phone: payload.phone,
        })
        .await?;

    tracing::info!("Registered client {user_id}");

    Ok(Json(MessageResponse {
        message: "client registered".to_string(),
    }))
}

/// login
///
/// [Public Route] Credential sign-in; issues the session token the access
/// middleware validates on every later request.
///
/// *Security*: unknown email and wrong password return the identical
/// `InvalidCredentials` error, so responses never reveal which factor
/// failed. Password verification runs through bcrypt's constant-time check.
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authorized", body = LoginResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let user = state
        .repo
        .find_user_by_email(&payload.email)
        .await?
        .ok_or(ApiError::InvalidCredentials)?;

    if !password::verify_password(&payload.password, &user.password_hash) {
        return Err(ApiError::InvalidCredentials);
    }

    let token = auth::issue_token(user.id, user.role, &state.config)?;

    tracing::info!("Authorized {} as {}", user.id, user.role);

    Ok(Json(LoginResponse {
        token,
        token_type: "Bearer".to_string(),
        expires_in: state.config.token_ttl_hours * 3600,
        role: user.role,
    }))
}

/// create_courier
///
/// [Admin Route] Creates a courier account: identity with role `courier`
/// plus its profile row, in one transaction. Availability starts true.
///
/// *Authorization*: the access middleware already required an `admin` token
/// to reach this path; the handler does not re-derive the role.
#[utoipa::path(
    post,
    path = "/admin/crear-mensajero",
    request_body = CreateCourierRequest,
    responses(
        (status = 200, description = "Courier created", body = MessageResponse),
        (status = 400, description = "Missing fields or duplicate email")
    )
)]
pub async fn create_courier(
    AuthUser { .. }: AuthUser,
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<CreateCourierRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    require_fields(&[
        ("email", &payload.email),
        ("password", &payload.password),
        ("name", &payload.name),
    ])?;

    if state.repo.email_taken(&payload.email).await? {
        return Err(ApiError::DuplicateEmail);
    }

    let password_hash = password::hash_password(&payload.password)?;

    let user_id = state
        .repo
        .create_courier(NewCourier {
            email: payload.email,
            password_hash,
            name: payload.name,
            phone: payload.phone,
            transport_type: payload.transport_type,
            rate: payload.rate,
            max_weight: payload.max_weight,
        })
        .await?;

    tracing::info!("Created courier {user_id}");

    Ok(Json(MessageResponse {
        message: "courier created".to_string(),
    }))
}

/// list_couriers
///
/// [Admin Route] The full courier fleet with identity emails, ordered by id.
/// No pagination; the fleet is bounded.
#[utoipa::path(
    get,
    path = "/admin/mensajeros",
    responses((status = 200, description = "All couriers", body = [CourierRecord]))
)]
pub async fn list_couriers(
    AuthUser { .. }: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<CourierRecord>>, ApiError> {
    let couriers = state.repo.list_couriers().await?;
    Ok(Json(couriers))
}

/// update_courier
///
/// [Admin Route] Partial update of a courier profile. Only the provided
/// fields change; omitted fields, `is_available` included, keep their
/// stored value. An unknown id is a 404, not a silent success.
#[utoipa::path(
    put,
    path = "/admin/mensajeros/{id}",
    params(("id" = i64, Path, description = "Courier identity id")),
    request_body = UpdateCourierRequest,
    responses(
        (status = 200, description = "Courier updated", body = MessageResponse),
        (status = 404, description = "No courier with that id")
    )
)]
pub async fn update_courier(
    AuthUser { .. }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    JsonBody(payload): JsonBody<UpdateCourierRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    if !state.repo.update_courier(id, payload).await? {
        return Err(ApiError::NotFound("courier"));
    }

    Ok(Json(MessageResponse {
        message: "courier updated".to_string(),
    }))
}

/// delete_courier
///
/// [Admin Route] Deletes the courier's identity record; the profile row goes
/// with it through the cascading foreign key, never by a direct delete.
///
/// *Idempotency*: deleting an id that no longer exists is a success, so
/// retries and double-clicks in the dashboard are harmless.
#[utoipa::path(
    delete,
    path = "/admin/mensajeros/{id}",
    params(("id" = i64, Path, description = "Courier identity id")),
    responses((status = 200, description = "Courier deleted", body = MessageResponse))
)]
pub async fn delete_courier(
    AuthUser { .. }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, ApiError> {
    if !state.repo.delete_user(id).await? {
        tracing::debug!("Delete of missing courier {id} treated as no-op");
    }

    Ok(Json(MessageResponse {
        message: "courier deleted".to_string(),
    }))
}

/// get_me
///
/// [Authenticated Route] Session check: the role decoded from the caller's
/// token. 401 with no usable session; no database read.
#[utoipa::path(
    get,
    path = "/me",
    responses(
        (status = 200, description = "Session role", body = SessionInfo),
        (status = 401, description = "No session")
    )
)]
pub async fn get_me(AuthUser { role, .. }: AuthUser) -> Json<SessionInfo> {
    Json(SessionInfo { role })
}

/// courier_profile
///
/// [Courier Route] The courier's own profile, looked up by the identity id
/// in the session token.
///
/// *Authorization*: the middleware gates the `/mensajero` scope, and the
/// handler still rejects non-courier sessions from the decoded token. It
/// never trusts anything the caller sent outside it.
#[utoipa::path(
    get,
    path = "/mensajero/perfil",
    responses(
        (status = 200, description = "Own profile", body = CourierProfile),
        (status = 401, description = "Not a courier session"),
        (status = 404, description = "Profile row missing")
    )
)]
pub async fn courier_profile(
    AuthUser { id, role }: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<CourierProfile>, ApiError> {
    if role != Role::Courier {
        return Err(ApiError::Unauthorized);
    }

    let profile = state
        .repo
        .get_courier_profile(id)
        .await?
        .ok_or(ApiError::NotFound("courier profile"))?;

    Ok(Json(profile))
}
