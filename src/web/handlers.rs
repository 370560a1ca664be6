use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Form, Json,
};
use serde_json::json;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::auth::context::AuthContext;
use crate::auth::handlers::is_valid_email;
use crate::auth::password::{hash_password, verify_password};
use crate::error::ApiError;
use crate::photos::{attach_photo, PhotoError, PhotoUpload};
use crate::records::dto::SearchParams;
use crate::records::service::RecordError;
use crate::state::AppState;
use crate::users::store::User;
use crate::web::flash;
use crate::web::forms::{LoginForm, RecordForm, RegisterForm};
use crate::web::session::{clear_session_cookie, cookie_value, session_cookie, AUTH_COOKIE};

fn redirect_with_flash(location: &str, kind: &str, message: &str) -> Response {
    let mut res = Redirect::to(location).into_response();
    res.headers_mut().append(
        header::SET_COOKIE,
        flash::set_cookie(kind, message).parse().unwrap(),
    );
    res
}

/// Attach a clear-cookie header when the request carried a flash, so the
/// message renders exactly once.
fn consume_flash(mut res: Response, headers: &HeaderMap) -> Response {
    if flash::present(headers) {
        res.headers_mut()
            .append(header::SET_COOKIE, flash::clear_cookie().parse().unwrap());
    }
    res
}

fn view(headers: &HeaderMap, body: serde_json::Value) -> Response {
    consume_flash(Json(body).into_response(), headers)
}

// --- auth pages & actions ---

#[instrument(skip(headers))]
pub async fn login_page(headers: HeaderMap) -> Response {
    let flash = flash::read(&headers);
    view(&headers, json!({ "page": "login", "flash": flash }))
}

#[instrument(skip(headers))]
pub async fn register_page(headers: HeaderMap) -> Response {
    let flash = flash::read(&headers);
    view(&headers, json!({ "page": "register", "flash": flash }))
}

#[instrument(skip(state, form))]
pub async fn login_form(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> Result<Response, ApiError> {
    let email = match form.email.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(e) => e.to_lowercase(),
        None => {
            return Ok(redirect_with_flash(
                "/auth/login",
                "error",
                "email and password are required",
            ))
        }
    };
    let Some(password) = form
        .password
        .as_deref()
        .filter(|s| !s.is_empty())
    else {
        return Ok(redirect_with_flash(
            "/auth/login",
            "error",
            "email and password are required",
        ));
    };

    let user = state.users.find_by_email(&email).await?;
    let matched = match &user {
        Some(user) => verify_password(password, &user.password_hash)?,
        None => false,
    };
    let Some(user) = user.filter(|_| matched) else {
        warn!(email = %email, "form login rejected");
        return Ok(redirect_with_flash(
            "/auth/login",
            "error",
            "email or password incorrect",
        ));
    };

    let token = state.codec.issue(user.id)?;
    // Same ordering rule as the API login: invalidate, then create.
    state.tokens.invalidate_all(user.id).await?;
    state.tokens.create(user.id, &token).await?;

    info!(user_id = %user.id, "form login");
    let mut res = Redirect::to("/").into_response();
    res.headers_mut()
        .append(header::SET_COOKIE, session_cookie(&token).parse().unwrap());
    Ok(res)
}

#[instrument(skip(state, form))]
pub async fn register_form(
    State(state): State<AppState>,
    Form(form): Form<RegisterForm>,
) -> Result<Response, ApiError> {
    let name = form.name.as_deref().map(str::trim).unwrap_or("");
    let email = form
        .email
        .as_deref()
        .map(str::trim)
        .unwrap_or("")
        .to_lowercase();
    let password = form.password.as_deref().unwrap_or("");

    if name.is_empty() || email.is_empty() || password.is_empty() {
        return Ok(redirect_with_flash(
            "/auth/register",
            "error",
            "all fields are required",
        ));
    }
    if !is_valid_email(&email) {
        return Ok(redirect_with_flash(
            "/auth/register",
            "error",
            "email format is invalid",
        ));
    }
    if state.users.find_by_email(&email).await?.is_some() {
        return Ok(redirect_with_flash(
            "/auth/register",
            "error",
            "user already registered with this email",
        ));
    }

    let hash = hash_password(password)?;
    let user = state.users.create(name, &email, &hash).await?;
    info!(user_id = %user.id, "form registration");

    Ok(redirect_with_flash(
        "/auth/login",
        "success",
        "registration successful, please sign in",
    ))
}

/// Revokes the session named by the cookie, best-effort, and always lands
/// back on the login page with a cleared cookie.
#[instrument(skip(state, headers))]
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(token) = cookie_value(&headers, AUTH_COOKIE).filter(|t| !t.is_empty()) {
        if let Some(user_id) = state.codec.extract_subject(token) {
            if let Err(e) = state.tokens.invalidate_all(user_id).await {
                error!(error = %e, user_id = %user_id, "logout token cleanup failed");
            } else {
                info!(user_id = %user_id, "logged out");
            }
        }
    }
    let mut res = Redirect::to("/auth/login").into_response();
    res.headers_mut().append(
        header::SET_COOKIE,
        clear_session_cookie().parse().unwrap(),
    );
    res
}

// --- record pages & actions ---

fn session_user(ctx: &AuthContext) -> Result<&User, Response> {
    ctx.user()
        .ok_or_else(|| Redirect::to("/auth/login").into_response())
}

#[instrument(skip(state, ctx, headers))]
pub async fn home(
    State(state): State<AppState>,
    ctx: AuthContext,
    Query(params): Query<SearchParams>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let user = match session_user(&ctx) {
        Ok(user) => user,
        Err(redirect) => return Ok(redirect),
    };
    let records = state.records.list(user.id, params.search.as_deref()).await?;
    let flash = flash::read(&headers);
    Ok(view(
        &headers,
        json!({
            "auth": user,
            "records": records,
            "search": params.search,
            "flash": flash,
        }),
    ))
}

#[instrument(skip(state, ctx, form))]
pub async fn add_record(
    State(state): State<AppState>,
    ctx: AuthContext,
    Form(form): Form<RecordForm>,
) -> Result<Response, ApiError> {
    let user = match session_user(&ctx) {
        Ok(user) => user,
        Err(redirect) => return Ok(redirect),
    };

    match state.records.create(user.id, form.to_input()).await {
        Ok(_) => Ok(redirect_with_flash(
            "/",
            "success",
            "health record added",
        )),
        Err(RecordError::Validation(message)) => Ok(redirect_with_flash("/", "error", message)),
        Err(RecordError::Internal(e)) => Err(e.into()),
    }
}

#[instrument(skip(state, ctx, form))]
pub async fn edit_record(
    State(state): State<AppState>,
    ctx: AuthContext,
    Form(form): Form<RecordForm>,
) -> Result<Response, ApiError> {
    let user = match session_user(&ctx) {
        Ok(user) => user,
        Err(redirect) => return Ok(redirect),
    };
    let Some(id) = form.record_id() else {
        return Ok(redirect_with_flash("/", "error", "record id is invalid"));
    };

    match state.records.update(user.id, id, form.to_input()).await {
        Ok(Some(_)) => Ok(redirect_with_flash("/", "success", "health record updated")),
        Ok(None) => Ok(redirect_with_flash(
            "/",
            "error",
            "failed to update health record",
        )),
        Err(RecordError::Validation(message)) => Ok(redirect_with_flash("/", "error", message)),
        Err(RecordError::Internal(e)) => Err(e.into()),
    }
}

#[instrument(skip(state, ctx, form))]
pub async fn delete_record(
    State(state): State<AppState>,
    ctx: AuthContext,
    Form(form): Form<RecordForm>,
) -> Result<Response, ApiError> {
    let user = match session_user(&ctx) {
        Ok(user) => user,
        Err(redirect) => return Ok(redirect),
    };
    let Some(id) = form.record_id() else {
        return Ok(redirect_with_flash("/", "error", "record id is invalid"));
    };

    if state.records.delete(user.id, id).await? {
        Ok(redirect_with_flash("/", "success", "health record deleted"))
    } else {
        Ok(redirect_with_flash(
            "/",
            "error",
            "health record not found",
        ))
    }
}

#[instrument(skip(state, ctx, headers))]
pub async fn record_detail(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let user = match session_user(&ctx) {
        Ok(user) => user,
        Err(redirect) => return Ok(redirect),
    };
    let Some(record) = state.records.get(user.id, id).await? else {
        return Ok(Redirect::to("/").into_response());
    };
    let flash = flash::read(&headers);
    Ok(view(
        &headers,
        json!({ "auth": user, "record": record, "flash": flash }),
    ))
}

#[instrument(skip(state, ctx, multipart))]
pub async fn edit_photo(
    State(state): State<AppState>,
    ctx: AuthContext,
    mut multipart: Multipart,
) -> Result<Response, ApiError> {
    let user = match session_user(&ctx) {
        Ok(user) => user,
        Err(redirect) => return Ok(redirect),
    };

    let mut record_id: Option<Uuid> = None;
    let mut upload = PhotoUpload {
        content_type: None,
        body: bytes::Bytes::new(),
    };
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("id") => {
                record_id = field
                    .text()
                    .await
                    .ok()
                    .and_then(|t| Uuid::parse_str(t.trim()).ok());
            }
            Some("photo") | Some("photoFile") => {
                upload.content_type = field.content_type().map(str::to_string);
                upload.body = field
                    .bytes()
                    .await
                    .map_err(|e| anyhow::anyhow!("read photo field: {e}"))?;
            }
            _ => {}
        }
    }

    let Some(id) = record_id else {
        return Ok(redirect_with_flash("/", "error", "record id is invalid"));
    };
    let detail = format!("/health-records/{id}");

    // Ownership check before touching any file.
    if state.records.get(user.id, id).await?.is_none() {
        return Ok(Redirect::to("/").into_response());
    }

    match attach_photo(
        &state.records,
        state.files.as_ref(),
        state.config.upload.max_photo_bytes,
        id,
        upload,
    )
    .await
    {
        Ok(_) => Ok(redirect_with_flash(&detail, "success", "photo uploaded")),
        Err(PhotoError::Internal(e)) => {
            error!(error = %e, record_id = %id, "photo upload failed");
            Ok(redirect_with_flash(
                &detail,
                "error",
                "failed to upload photo",
            ))
        }
        Err(failure) => Ok(redirect_with_flash(&detail, "error", &failure.to_string())),
    }
}

fn mime_for_filename(filename: &str) -> &'static str {
    let ext = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase());
    match ext.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

#[instrument(skip(state))]
pub async fn photo(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response, ApiError> {
    match state.files.load(&filename).await? {
        Some(bytes) => Ok((
            [(header::CONTENT_TYPE, mime_for_filename(&filename))],
            bytes,
        )
            .into_response()),
        None => Ok(StatusCode::NOT_FOUND.into_response()),
    }
}
