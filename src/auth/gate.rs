use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::warn;

use crate::auth::context::AuthContext;
use crate::auth::jwt::TokenCodec;
use crate::auth::store::TokenStore;
use crate::response::ApiResponse;
use crate::state::AppState;
use crate::users::store::{User, UserStore};

/// Terminal rejection of the per-request authentication pipeline.
#[derive(Debug, Error)]
pub enum AuthFailure {
    #[error("authentication token not found")]
    MissingToken,
    #[error("authentication token invalid")]
    InvalidToken,
    #[error("authentication token format invalid")]
    MalformedToken,
    // A verifiable credential with no matching store row: revoked by
    // logout, password change, or a newer login.
    #[error("authentication token expired")]
    ExpiredToken,
    #[error("user not found")]
    UnknownUser,
    #[error("authentication backend unavailable")]
    Backend(#[from] anyhow::Error),
}

impl AuthFailure {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthFailure::MissingToken
            | AuthFailure::InvalidToken
            | AuthFailure::MalformedToken
            | AuthFailure::ExpiredToken => StatusCode::UNAUTHORIZED,
            AuthFailure::UnknownUser => StatusCode::NOT_FOUND,
            AuthFailure::Backend(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Paths served without a credential: the auth surfaces themselves, static
/// assets, and the error endpoints.
pub fn is_public(path: &str) -> bool {
    path.starts_with("/auth/")
        || path.starts_with("/api/auth/")
        || path.starts_with("/assets/")
        || path.starts_with("/css/")
        || path.starts_with("/js/")
        || path.starts_with("/images/")
        || path == "/error"
        || path == "/health"
        || path == "/favicon.ico"
}

/// Verify-and-resolve core shared by the bearer and cookie adapters.
///
/// The order is load-bearing: the signature check rejects garbage before any
/// store I/O, and the liveness check runs before user resolution so a revoked
/// token cannot probe whether its user still exists.
pub async fn authenticate(
    codec: &TokenCodec,
    tokens: &dyn TokenStore,
    users: &dyn UserStore,
    token: &str,
) -> Result<User, AuthFailure> {
    if codec.verify(token, false).is_err() {
        return Err(AuthFailure::InvalidToken);
    }
    let Some(user_id) = codec.extract_subject(token) else {
        return Err(AuthFailure::MalformedToken);
    };
    if tokens.find_active(user_id, token).await?.is_none() {
        return Err(AuthFailure::ExpiredToken);
    }
    let Some(user) = users.find_by_id(user_id).await? else {
        return Err(AuthFailure::UnknownUser);
    };
    Ok(user)
}

/// Non-empty token from an `Authorization: Bearer ...` header.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?;
    (!token.is_empty()).then_some(token)
}

/// Bearer-token adapter for the JSON API: gates every non-public path,
/// populating the request-scoped [`AuthContext`] on success and
/// short-circuiting with an envelope response on failure.
pub async fn api_gate(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    if is_public(req.uri().path()) {
        return next.run(req).await;
    }

    let Some(token) = bearer_token(req.headers()).map(str::to_owned) else {
        return reject(AuthFailure::MissingToken);
    };

    match authenticate(
        &state.codec,
        state.tokens.as_ref(),
        state.users.as_ref(),
        &token,
    )
    .await
    {
        Ok(user) => {
            let mut ctx = AuthContext::default();
            ctx.set_user(user);
            req.extensions_mut().insert(ctx);
            next.run(req).await
        }
        Err(failure) => {
            warn!(path = %req.uri().path(), failure = %failure, "request rejected");
            reject(failure)
        }
    }
}

fn reject(failure: AuthFailure) -> Response {
    let status = failure.status();
    let body = match &failure {
        AuthFailure::Backend(_) => ApiResponse::error(failure.to_string()),
        _ => ApiResponse::fail(failure.to_string()),
    };
    (status, Json(body)).into_response()
}
