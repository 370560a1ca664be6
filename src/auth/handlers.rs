use axum::{
    extract::State,
    routing::post,
    Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::json;
use tracing::{info, instrument, warn};

use crate::auth::dto::{LoginRequest, RegisterRequest};
use crate::auth::password::{hash_password, verify_password};
use crate::error::{required_field, ApiError};
use crate::response::ApiResponse;
use crate::state::AppState;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<ApiResponse>, ApiError> {
    let name = required_field(&payload.name, "name is required")?;
    let email = required_field(&payload.email, "email is required")?
        .to_lowercase();
    let password = required_field(&payload.password, "password is required")?;

    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(ApiError::Validation("email format is invalid".into()));
    }

    if state.users.find_by_email(&email).await?.is_some() {
        warn!(email = %email, "email already registered");
        return Err(ApiError::Conflict(
            "user already registered with this email".into(),
        ));
    }

    let hash = hash_password(password)?;
    let user = state.users.create(name, &email, &hash).await?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok(Json(ApiResponse::created(
        "user registered successfully",
        json!({ "id": user.id }),
    )))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<ApiResponse>, ApiError> {
    let email = required_field(&payload.email, "email is required")?
        .to_lowercase();
    let password = required_field(&payload.password, "password is required")?;

    let Some(user) = state.users.find_by_email(&email).await? else {
        warn!(email = %email, "login unknown email");
        return Err(ApiError::Validation("email or password incorrect".into()));
    };

    if !verify_password(password, &user.password_hash)? {
        warn!(email = %email, user_id = %user.id, "login invalid password");
        return Err(ApiError::Validation("email or password incorrect".into()));
    }

    let token = state.codec.issue(user.id)?;

    // Invalidation must commit before the replacement row is written, or two
    // live tokens could briefly coexist for the user.
    state.tokens.invalidate_all(user.id).await?;
    state.tokens.create(user.id, &token).await?;

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(Json(ApiResponse::success(
        "login successful",
        json!({ "token": token }),
    )))
}
