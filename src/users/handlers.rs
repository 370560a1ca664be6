use axum::{
    extract::State,
    routing::{get, put},
    Json, Router,
};
use serde_json::json;
use tracing::{info, instrument, warn};

use crate::auth::context::AuthContext;
use crate::auth::password::{hash_password, verify_password};
use crate::error::{required_field, ApiError};
use crate::response::ApiResponse;
use crate::state::AppState;
use crate::users::dto::{UpdatePasswordRequest, UpdateProfileRequest};
use crate::users::store::User;

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/api/users/me", get(get_me).put(update_profile))
        .route("/api/users/me/password", put(update_password))
}

fn current_user(ctx: &AuthContext) -> Result<&User, ApiError> {
    ctx.user()
        .ok_or_else(|| ApiError::Authentication("user not authenticated".into()))
}

#[instrument(skip(ctx))]
pub async fn get_me(ctx: AuthContext) -> Result<Json<ApiResponse>, ApiError> {
    let user = current_user(&ctx)?;
    Ok(Json(ApiResponse::success(
        "user retrieved successfully",
        json!({ "user": user }),
    )))
}

#[instrument(skip(state, ctx, payload))]
pub async fn update_profile(
    State(state): State<AppState>,
    ctx: AuthContext,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<ApiResponse>, ApiError> {
    let user = current_user(&ctx)?;
    let name = required_field(&payload.name, "name is required")?;
    let email = required_field(&payload.email, "email is required")?.to_lowercase();

    let Some(updated) = state.users.update_profile(user.id, name, &email).await? else {
        return Err(ApiError::NotFound("user not found".into()));
    };

    info!(user_id = %updated.id, "profile updated");
    Ok(Json(ApiResponse::success(
        "profile updated successfully",
        json!({ "user": updated }),
    )))
}

#[instrument(skip(state, ctx, payload))]
pub async fn update_password(
    State(state): State<AppState>,
    ctx: AuthContext,
    Json(payload): Json<UpdatePasswordRequest>,
) -> Result<Json<ApiResponse>, ApiError> {
    let user = current_user(&ctx)?;
    let password = required_field(&payload.password, "password is required")?;
    let new_password = required_field(&payload.new_password, "new password is required")?;

    if !verify_password(password, &user.password_hash)? {
        warn!(user_id = %user.id, "password confirmation mismatch");
        return Err(ApiError::Validation(
            "password confirmation does not match".into(),
        ));
    }

    let hash = hash_password(new_password)?;
    let Some(updated) = state.users.update_password(user.id, &hash).await? else {
        return Err(ApiError::NotFound("user not found".into()));
    };

    // A password change revokes every live session for the user.
    state.tokens.invalidate_all(updated.id).await?;

    info!(user_id = %updated.id, "password updated, sessions revoked");
    Ok(Json(ApiResponse::ok("password updated successfully")))
}
