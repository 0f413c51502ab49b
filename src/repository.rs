use crate::error::ApiError;
use crate::models::{
    CourierProfile, CourierRecord, NewClient, NewCourier, Role, UpdateCourierRequest, User,
};
use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::{Arc, Mutex};

// 1. Repository Contract

/// Repository
///
/// Defines the abstract contract for the credential store: identity records
/// plus their role profiles. Handlers interact with persistence only through
/// this trait, so the Postgres implementation and the in-memory test
/// implementation are interchangeable behind `Arc<dyn Repository>`.
///
/// Every method returns `Result<_, ApiError>`: persistence failures surface
/// as `ApiError::Persistence` and the identity inserts map a unique-index
/// conflict to `ApiError::DuplicateEmail`.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Identity lookups ---
    /// Case-insensitive lookup of an identity record by email.
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, ApiError>;
    /// Fast-path duplicate hint. The unique index on LOWER(email) remains
    /// the authoritative signal; a `false` here can still lose the race.
    async fn email_taken(&self, email: &str) -> Result<bool, ApiError>;

    // --- Composite writes (identity + profile, one transaction) ---
    /// Insert a `client` identity and its client profile atomically.
    /// Returns the new identity id.
    async fn register_client(&self, new: NewClient) -> Result<i64, ApiError>;
    /// Insert a `courier` identity and its courier profile atomically.
    /// Availability starts true. Returns the new identity id.
    async fn create_courier(&self, new: NewCourier) -> Result<i64, ApiError>;

    // --- Courier administration ---
    /// All couriers joined with their identity email, ordered by id.
    async fn list_couriers(&self) -> Result<Vec<CourierRecord>, ApiError>;
    /// Partial update: only the `Some` fields change, every omitted field
    /// keeps its current value. Returns false when no profile row matches.
    async fn update_courier(
        &self,
        user_id: i64,
        req: UpdateCourierRequest,
    ) -> Result<bool, ApiError>;
    /// Delete the identity record; profile rows go with it via the cascade.
    /// Returns false when no identity row matched (not an error).
    async fn delete_user(&self, user_id: i64) -> Result<bool, ApiError>;

    // --- Courier self-service ---
    async fn get_courier_profile(&self, user_id: i64) -> Result<Option<CourierProfile>, ApiError>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the
/// application state.
pub type RepositoryState = Arc<dyn Repository>;

/// Lookup normalization. Stored emails keep their submitted casing
/// (trimmed); every comparison goes through LOWER on both sides.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Map a unique-index violation (SQLSTATE 23505) on the identity insert to
/// the duplicate-email error; anything else stays a persistence failure.
fn map_unique_violation(err: sqlx::Error) -> ApiError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => ApiError::DuplicateEmail,
        _ => ApiError::Persistence(err),
    }
}

// 2. The Postgres Implementation

/// PostgresRepository
///
/// The concrete implementation of the `Repository` trait, backed by the
/// PostgreSQL database. Composite writes run inside an explicit transaction;
/// dropping the transaction guard on an early error return rolls back, so no
/// partial identity/profile state ever commits.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, ApiError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, password, role FROM users WHERE LOWER(email) = $1",
        )
        .bind(normalize_email(email))
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn email_taken(&self, email: &str) -> Result<bool, ApiError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM users WHERE LOWER(email) = $1)",
        )
        .bind(normalize_email(email))
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    /// register_client
    ///
    /// Identity insert followed by the client profile insert, one
    /// transaction. A concurrent registration with the same email loses at
    /// the unique index and comes back as `DuplicateEmail`.
    async fn register_client(&self, new: NewClient) -> Result<i64, ApiError> {
        let mut tx = self.pool.begin().await?;

        let user_id: i64 = sqlx::query_scalar(
            "INSERT INTO users (email, password, role) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(new.email.trim())
        .bind(&new.password_hash)
        .bind(Role::Client)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_unique_violation)?;

        sqlx::query("INSERT INTO clients (user_id, name, phone) VALUES ($1, $2, $3)")
            .bind(user_id)
            .bind(new.name.trim())
            .bind(new.phone.as_deref())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(user_id)
    }

    /// create_courier
    ///
    /// Same shape as `register_client` with the courier profile table.
    /// `is_available` is not in the column list; the schema default (true)
    /// applies.
    async fn create_courier(&self, new: NewCourier) -> Result<i64, ApiError> {
        let mut tx = self.pool.begin().await?;

        let user_id: i64 = sqlx::query_scalar(
            "INSERT INTO users (email, password, role) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(new.email.trim())
        .bind(&new.password_hash)
        .bind(Role::Courier)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_unique_violation)?;

        sqlx::query(
            "INSERT INTO couriers (user_id, name, phone, transport_type, rate, max_weight) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(user_id)
        .bind(new.name.trim())
        .bind(new.phone.as_deref())
        .bind(new.transport_type.as_deref())
        .bind(new.rate)
        .bind(new.max_weight)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(user_id)
    }

    async fn list_couriers(&self) -> Result<Vec<CourierRecord>, ApiError> {
        let couriers = sqlx::query_as::<_, CourierRecord>(
            r#"
            SELECT c.user_id AS id, c.name, c.phone, c.transport_type, c.is_available, u.email
            FROM couriers c
            JOIN users u ON u.id = c.user_id
            ORDER BY c.user_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(couriers)
    }

    /// update_courier
    ///
    /// Uses the PostgreSQL `COALESCE` function per column so that only the
    /// provided fields change; a `None` bind leaves the stored value in
    /// place, including `is_available`.
    async fn update_courier(
        &self,
        user_id: i64,
        req: UpdateCourierRequest,
    ) -> Result<bool, ApiError> {
        let result = sqlx::query(
            r#"
            UPDATE couriers
            SET name = COALESCE($2, name),
                phone = COALESCE($3, phone),
                transport_type = COALESCE($4, transport_type),
                rate = COALESCE($5, rate),
                max_weight = COALESCE($6, max_weight),
                is_available = COALESCE($7, is_available)
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .bind(req.name.as_deref())
        .bind(req.phone.as_deref())
        .bind(req.transport_type.as_deref())
        .bind(req.rate)
        .bind(req.max_weight)
        .bind(req.is_available)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// delete_user
    ///
    /// Deletes only the identity row; the ON DELETE CASCADE foreign keys
    /// remove the courier or client profile in the same statement.
    async fn delete_user(&self, user_id: i64) -> Result<bool, ApiError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn get_courier_profile(&self, user_id: i64) -> Result<Option<CourierProfile>, ApiError> {
        let profile = sqlx::query_as::<_, CourierProfile>(
            r#"
            SELECT c.name, c.phone, c.transport_type, c.rate, c.max_weight, u.email
            FROM couriers c
            JOIN users u ON u.id = c.user_id
            WHERE c.user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(profile)
    }
}

// 3. The In-Memory Implementation (For Tests)

/// Stored courier profile row in the in-memory store.
#[derive(Debug, Clone)]
struct MemCourier {
    user_id: i64,
    name: String,
    phone: Option<String>,
    transport_type: Option<String>,
    rate: Option<f64>,
    max_weight: Option<f64>,
    is_available: bool,
}

/// Stored client profile row in the in-memory store. Nothing reads client
/// profile fields back in this flow, so only the identity linkage is kept.
#[derive(Debug, Clone)]
struct MemClient {
    user_id: i64,
}

#[derive(Debug, Default)]
struct MemoryState {
    next_id: i64,
    users: Vec<User>,
    couriers: Vec<MemCourier>,
    clients: Vec<MemClient>,
}

/// MemoryRepository
///
/// An in-process implementation of `Repository` used by the test suites, so
/// handler and middleware behavior can be exercised without a database. It
/// mirrors the store semantics the Postgres implementation gets from the
/// schema: case-insensitive email uniqueness, availability defaulting to
/// true, coalescing partial update, and cascade delete of profile rows.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    state: Mutex<MemoryState>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Row counts as (users, couriers, clients), for atomicity assertions.
    pub fn counts(&self) -> (usize, usize, usize) {
        let state = self.state.lock().unwrap();
        (
            state.users.len(),
            state.couriers.len(),
            state.clients.len(),
        )
    }

    /// Seed an admin identity directly. Admin accounts have no creation
    /// endpoint; they are provisioned straight into the store, which is what
    /// this stands in for. Returns the new identity id.
    pub fn seed_admin(&self, email: &str, password_hash: &str) -> i64 {
        let mut state = self.state.lock().unwrap();

        state.next_id += 1;
        let user_id = state.next_id;

        state.users.push(User {
            id: user_id,
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            role: Role::Admin,
        });

        user_id
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, ApiError> {
        let needle = normalize_email(email);
        let state = self.state.lock().unwrap();

        Ok(state
            .users
            .iter()
            .find(|u| normalize_email(&u.email) == needle)
            .cloned())
    }

    async fn email_taken(&self, email: &str) -> Result<bool, ApiError> {
        let needle = normalize_email(email);
        let state = self.state.lock().unwrap();

        Ok(state
            .users
            .iter()
            .any(|u| normalize_email(&u.email) == needle))
    }

    async fn register_client(&self, new: NewClient) -> Result<i64, ApiError> {
        let mut state = self.state.lock().unwrap();

        // The stand-in for the unique index: reject before touching state,
        // so a duplicate leaves zero new rows.
        let needle = normalize_email(&new.email);
        if state.users.iter().any(|u| normalize_email(&u.email) == needle) {
            return Err(ApiError::DuplicateEmail);
        }

        state.next_id += 1;
        let user_id = state.next_id;

        state.users.push(User {
            id: user_id,
            email: new.email.trim().to_string(),
            password_hash: new.password_hash,
            role: Role::Client,
        });
        state.clients.push(MemClient { user_id });

        Ok(user_id)
    }

    async fn create_courier(&self, new: NewCourier) -> Result<i64, ApiError> {
        let mut state = self.state.lock().unwrap();

        let needle = normalize_email(&new.email);
        if state.users.iter().any(|u| normalize_email(&u.email) == needle) {
            return Err(ApiError::DuplicateEmail);
        }

        state.next_id += 1;
        let user_id = state.next_id;

        state.users.push(User {
            id: user_id,
            email: new.email.trim().to_string(),
            password_hash: new.password_hash,
            role: Role::Courier,
        });
        state.couriers.push(MemCourier {
            user_id,
            name: new.name.trim().to_string(),
            phone: new.phone,
            transport_type: new.transport_type,
            rate: new.rate,
            max_weight: new.max_weight,
            is_available: true,
        });

        Ok(user_id)
    }

    async fn list_couriers(&self) -> Result<Vec<CourierRecord>, ApiError> {
        let state = self.state.lock().unwrap();

        let mut records: Vec<CourierRecord> = state
            .couriers
            .iter()
            .filter_map(|c| {
                let user = state.users.iter().find(|u| u.id == c.user_id)?;
                Some(CourierRecord {
                    id: c.user_id,
                    name: c.name.clone(),
                    phone: c.phone.clone(),
                    transport_type: c.transport_type.clone(),
                    is_available: c.is_available,
                    email: user.email.clone(),
                })
            })
            .collect();
        records.sort_by_key(|r| r.id);

        Ok(records)
    }

    async fn update_courier(
        &self,
        user_id: i64,
        req: UpdateCourierRequest,
    ) -> Result<bool, ApiError> {
        let mut state = self.state.lock().unwrap();

        let Some(courier) = state.couriers.iter_mut().find(|c| c.user_id == user_id) else {
            return Ok(false);
        };

        if let Some(name) = req.name {
            courier.name = name;
        }
        if let Some(phone) = req.phone {
            courier.phone = Some(phone);
        }
        if let Some(transport_type) = req.transport_type {
            courier.transport_type = Some(transport_type);
        }
        if let Some(rate) = req.rate {
            courier.rate = Some(rate);
        }
        if let Some(max_weight) = req.max_weight {
            courier.max_weight = Some(max_weight);
        }
        if let Some(is_available) = req.is_available {
            courier.is_available = is_available;
        }

        Ok(true)
    }

    async fn delete_user(&self, user_id: i64) -> Result<bool, ApiError> {
        let mut state = self.state.lock().unwrap();

        let before = state.users.len();
        state.users.retain(|u| u.id != user_id);
        let deleted = state.users.len() < before;

        if deleted {
            // Cascade, as the foreign keys do in Postgres.
            state.couriers.retain(|c| c.user_id != user_id);
            state.clients.retain(|c| c.user_id != user_id);
        }

        Ok(deleted)
    }

    async fn get_courier_profile(&self, user_id: i64) -> Result<Option<CourierProfile>, ApiError> {
        let state = self.state.lock().unwrap();

        let Some(courier) = state.couriers.iter().find(|c| c.user_id == user_id) else {
            return Ok(None);
        };
        let Some(user) = state.users.iter().find(|u| u.id == user_id) else {
            return Ok(None);
        };

        Ok(Some(CourierProfile {
            name: courier.name.clone(),
            phone: courier.phone.clone(),
            transport_type: courier.transport_type.clone(),
            rate: courier.rate,
            max_weight: courier.max_weight,
            email: user.email.clone(),
        }))
    }
}
