use std::sync::Arc;

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use rand_core::OsRng;
use tracing::info;
use uuid::Uuid;

use ember_core::{Pins, Relationships};
use ember_db::Database;
use ember_types::api::{LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};

use crate::blocking;
use crate::error::{ApiError, ApiResult};
use crate::middleware::JwtKeys;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Arc<Database>,
    pub relationships: Relationships,
    pub pins: Pins,
    pub jwt: JwtKeys,
}

impl AppStateInner {
    pub fn new(db: Arc<Database>, jwt_secret: &str, token_ttl: chrono::Duration) -> Self {
        Self {
            relationships: Relationships::new(db.clone()),
            pins: Pins::new(db.clone()),
            jwt: JwtKeys::new(jwt_secret, token_ttl),
            db,
        }
    }
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<impl IntoResponse> {
    // Validate input
    let username = req.username.trim().to_string();
    let email = req.email.trim().to_lowercase();
    if username.len() < 3 || username.len() > 32 {
        return Err(ApiError::BadRequest("username must be 3 to 32 characters".into()));
    }
    if !email.contains('@') {
        return Err(ApiError::BadRequest("invalid email".into()));
    }
    if req.password.len() < 8 {
        return Err(ApiError::BadRequest("password must be at least 8 characters".into()));
    }
    let display_name = req
        .display_name
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty());

    // Check if username or email is taken
    let taken = {
        let state = state.clone();
        let (username, email) = (username.clone(), email.clone());
        blocking(move || Ok(state.db.user_identity_taken(&username, &email)?)).await?
    };
    if taken {
        return Err(ApiError::Conflict("username or email already registered".into()));
    }

    // Hash password with Argon2id
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|e| ApiError::Internal(format!("password hashing failed: {e}")))?
        .to_string();

    let user_id = Uuid::new_v4();

    // A concurrent registration can slip past the check above.
    let created = {
        let state = state.clone();
        let username = username.clone();
        blocking(move || {
            Ok(state.db.create_user(
                &user_id.to_string(),
                &username,
                &email,
                &password_hash,
                display_name.as_deref(),
            )?)
        })
        .await?
    };
    if !created {
        return Err(ApiError::Conflict("username or email already registered".into()));
    }

    let token = state.jwt.issue(user_id, &username)?;
    info!(%user_id, %username, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user_id,
            token,
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    let email = req.email.trim().to_lowercase();
    let user = {
        let state = state.clone();
        blocking(move || Ok(state.db.get_credentials_by_email(&email)?))
            .await?
            .ok_or(ApiError::Unauthorized)?
    };

    // Verify password
    let parsed_hash = PasswordHash::new(&user.password)
        .map_err(|e| ApiError::Internal(format!("corrupt password hash for {}: {e}", user.id)))?;

    Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .map_err(|_| ApiError::Unauthorized)?;

    let user_id: Uuid = user
        .id
        .parse()
        .map_err(|e| ApiError::Internal(format!("corrupt user id '{}': {e}", user.id)))?;

    let token = state.jwt.issue(user_id, &user.username)?;

    Ok(Json(LoginResponse {
        user_id,
        username: user.username,
        token,
    }))
}
