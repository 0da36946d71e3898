use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, FixedOffset};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set, SqlErr};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use super::jwt::{generate_token_pair, validate_token, TokenPair, TokenType};
use super::middleware::AuthUser;
use super::password::{hash_password, is_acceptable_password, verify_password, MIN_PASSWORD_LEN};
use crate::state::AppState;
use armed_db::entities::user;

// ─── Request/Response DTOs ──────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub username: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub username: Option<String>,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    pub created_at: DateTime<FixedOffset>,
}

impl From<user::Model> for UserResponse {
    fn from(u: user::Model) -> Self {
        Self {
            id: u.id,
            email: u.email,
            username: u.username,
            name: u.name,
            avatar_url: u.avatar_url,
            bio: u.bio,
            created_at: u.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: UserResponse,
    pub tokens: TokenPair,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

type AuthError = (StatusCode, Json<ErrorResponse>);

fn fail(status: StatusCode, message: &str) -> AuthError {
    (
        status,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
}

fn internal(context: &str, err: impl std::fmt::Display) -> AuthError {
    tracing::error!("{context}: {err}");
    fail(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
}

// ─── Validation ────────────────────────────────────────────────────

fn is_valid_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !domain.contains('@')
                && email.len() <= 254
        }
        None => false,
    }
}

fn validate_username(username: &str) -> Result<(), &'static str> {
    let len = username.chars().count();
    if !(3..=64).contains(&len) {
        return Err("Username must be between 3 and 64 characters");
    }
    if username.contains(['@', '/', ' ']) {
        return Err("Username cannot contain @, / or spaces");
    }
    Ok(())
}

fn issue_tokens(user: &user::Model, secret: &str) -> Result<TokenPair, AuthError> {
    generate_token_pair(user.id, &user.email, secret).map_err(|e| internal("token error", e))
}

// ─── Handlers ──────────────────────────────────────────────────────

/// POST /api/auth/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AuthError> {
    let email = body.email.trim().to_lowercase();
    if !is_valid_email(&email) {
        return Err(fail(StatusCode::BAD_REQUEST, "Invalid email address"));
    }

    if !is_acceptable_password(&body.password) {
        return Err(fail(
            StatusCode::BAD_REQUEST,
            &format!("Password must be at least {MIN_PASSWORD_LEN} characters"),
        ));
    }

    let username = body
        .username
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .map(String::from);
    if let Some(name) = &username {
        validate_username(name).map_err(|msg| fail(StatusCode::BAD_REQUEST, msg))?;
    }

    let mut taken = user::Column::Email.eq(&email);
    if let Some(name) = &username {
        taken = taken.or(user::Column::Username.eq(name));
    }
    let existing = user::Entity::find()
        .filter(taken)
        .one(state.db())
        .await
        .map_err(|e| internal("db error", e))?;
    if existing.is_some() {
        return Err(fail(StatusCode::CONFLICT, "Email or username already taken"));
    }

    let password_hash = hash_password(&body.password).map_err(|e| internal("hash error", e))?;

    let now = chrono::Utc::now().fixed_offset();
    let new_user = user::ActiveModel {
        id: Set(Uuid::new_v4()),
        email: Set(email),
        username: Set(username),
        password_hash: Set(password_hash),
        name: Set(body.name.filter(|n| !n.trim().is_empty())),
        avatar_url: Set(None),
        bio: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    };

    let created = new_user.insert(state.db()).await.map_err(|e| {
        if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
            fail(StatusCode::CONFLICT, "Email or username already taken")
        } else {
            internal("insert error", e)
        }
    })?;

    tracing::info!(user_id = %created.id, "user registered");
    let tokens = issue_tokens(&created, &state.jwt_secret)?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user: created.into(),
            tokens,
        }),
    ))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AuthError> {
    let email = body.email.trim().to_lowercase();
    let found = user::Entity::find()
        .filter(user::Column::Email.eq(&email))
        .one(state.db())
        .await
        .map_err(|e| internal("db error", e))?;

    let user = found.ok_or_else(|| fail(StatusCode::UNAUTHORIZED, "Invalid credentials"))?;

    let valid = verify_password(&body.password, &user.password_hash)
        .map_err(|e| internal("verify error", e))?;
    if !valid {
        return Err(fail(StatusCode::UNAUTHORIZED, "Invalid credentials"));
    }

    let tokens = issue_tokens(&user, &state.jwt_secret)?;
    Ok(Json(AuthResponse {
        user: user.into(),
        tokens,
    }))
}

/// POST /api/auth/refresh
pub async fn refresh(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RefreshRequest>,
) -> Result<Json<TokenPair>, AuthError> {
    let claims = validate_token(&body.refresh_token, &state.jwt_secret)
        .map_err(|_| fail(StatusCode::UNAUTHORIZED, "Invalid or expired refresh token"))?;

    if claims.token_type != TokenType::Refresh {
        return Err(fail(StatusCode::UNAUTHORIZED, "Invalid token type"));
    }

    // The account may have been removed since the token was issued.
    let user = user::Entity::find_by_id(claims.sub)
        .one(state.db())
        .await
        .map_err(|e| internal("db error", e))?
        .ok_or_else(|| fail(StatusCode::UNAUTHORIZED, "User not found"))?;

    Ok(Json(issue_tokens(&user, &state.jwt_secret)?))
}

/// GET /api/auth/me
pub async fn me(
    State(state): State<Arc<AppState>>,
    axum::Extension(auth_user): axum::Extension<AuthUser>,
) -> Result<Json<UserResponse>, AuthError> {
    let user = user::Entity::find_by_id(auth_user.id())
        .one(state.db())
        .await
        .map_err(|e| internal("db error", e))?
        .ok_or_else(|| fail(StatusCode::NOT_FOUND, "User not found"))?;

    Ok(Json(user.into()))
}
