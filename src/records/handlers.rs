use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde_json::json;
use tracing::instrument;
use uuid::Uuid;

use crate::auth::context::AuthContext;
use crate::error::ApiError;
use crate::records::dto::{RecordInput, SearchParams};
use crate::records::service::RecordError;
use crate::response::ApiResponse;
use crate::state::AppState;

pub fn record_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/health-records",
            get(list_records).post(create_record),
        )
        .route(
            "/api/health-records/:id",
            get(get_record).put(update_record).delete(delete_record),
        )
}

/// These endpoints keep the legacy convention: an unauthenticated context is
/// a 403 "fail", not a 401.
fn owner_id(ctx: &AuthContext) -> Result<Uuid, ApiError> {
    ctx.user()
        .map(|u| u.id)
        .ok_or_else(|| ApiError::Authorization("user not authenticated".into()))
}

impl From<RecordError> for ApiError {
    fn from(err: RecordError) -> Self {
        match err {
            RecordError::Validation(message) => ApiError::Validation(message.into()),
            RecordError::Internal(e) => ApiError::Internal(e),
        }
    }
}

#[instrument(skip(state, ctx, payload))]
pub async fn create_record(
    State(state): State<AppState>,
    ctx: AuthContext,
    Json(payload): Json<RecordInput>,
) -> Result<Json<ApiResponse>, ApiError> {
    let owner = owner_id(&ctx)?;
    let record = state.records.create(owner, payload).await?;
    Ok(Json(ApiResponse::success(
        "health record created successfully",
        json!({ "id": record.id }),
    )))
}

#[instrument(skip(state, ctx))]
pub async fn list_records(
    State(state): State<AppState>,
    ctx: AuthContext,
    Query(params): Query<SearchParams>,
) -> Result<Json<ApiResponse>, ApiError> {
    let owner = owner_id(&ctx)?;
    let records = state.records.list(owner, params.search.as_deref()).await?;
    Ok(Json(ApiResponse::success(
        "health records retrieved successfully",
        json!({ "records": records }),
    )))
}

#[instrument(skip(state, ctx))]
pub async fn get_record(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse>, ApiError> {
    let owner = owner_id(&ctx)?;
    let Some(record) = state.records.get(owner, id).await? else {
        return Err(ApiError::NotFound("health record not found".into()));
    };
    Ok(Json(ApiResponse::success(
        "health record retrieved successfully",
        json!({ "record": record }),
    )))
}

#[instrument(skip(state, ctx, payload))]
pub async fn update_record(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<RecordInput>,
) -> Result<Json<ApiResponse>, ApiError> {
    let owner = owner_id(&ctx)?;
    match state.records.update(owner, id, payload).await? {
        Some(_) => Ok(Json(ApiResponse::ok("health record updated successfully"))),
        None => Err(ApiError::NotFound(
            "health record not found or access denied".into(),
        )),
    }
}

#[instrument(skip(state, ctx))]
pub async fn delete_record(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse>, ApiError> {
    let owner = owner_id(&ctx)?;
    if !state.records.delete(owner, id).await? {
        return Err(ApiError::NotFound("health record not found".into()));
    }
    Ok(Json(ApiResponse::ok("health record deleted successfully")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::store::User;
    use time::OffsetDateTime;

    fn ctx_with_user() -> (AuthContext, Uuid) {
        let user = User {
            id: Uuid::new_v4(),
            name: "Tester".into(),
            email: "test@example.com".into(),
            password_hash: "hash".into(),
            created_at: OffsetDateTime::now_utc(),
            updated_at: OffsetDateTime::now_utc(),
        };
        let id = user.id;
        let mut ctx = AuthContext::default();
        ctx.set_user(user);
        (ctx, id)
    }

    fn valid_input() -> RecordInput {
        RecordInput {
            body_temperature: Some(36.5),
            blood_pressure: Some("120/80".into()),
            heart_rate: Some(72),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn unauthenticated_context_is_a_403_fail() {
        let state = AppState::fake();
        let err = create_record(
            State(state.clone()),
            AuthContext::default(),
            Json(valid_input()),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::FORBIDDEN);
        assert_eq!(err.to_string(), "user not authenticated");
    }

    #[tokio::test]
    async fn create_then_get_round_trip() {
        let state = AppState::fake();
        let (ctx, owner) = ctx_with_user();

        let Json(created) = create_record(State(state.clone()), ctx.clone(), Json(valid_input()))
            .await
            .unwrap();
        let id: Uuid =
            serde_json::from_value(created.data.unwrap()["id"].clone()).unwrap();

        let Json(fetched) = get_record(State(state.clone()), ctx.clone(), Path(id))
            .await
            .unwrap();
        let record = fetched.data.unwrap()["record"].clone();
        assert_eq!(record["userId"], json!(owner));
        assert_eq!(record["bodyTemperature"], json!(36.5));
        assert_eq!(record["bloodPressure"], json!("120/80"));
    }

    #[tokio::test]
    async fn cross_user_access_behaves_as_not_found() {
        let state = AppState::fake();
        let (owner_ctx, _) = ctx_with_user();
        let (intruder_ctx, _) = ctx_with_user();

        let Json(created) = create_record(
            State(state.clone()),
            owner_ctx.clone(),
            Json(valid_input()),
        )
        .await
        .unwrap();
        let id: Uuid =
            serde_json::from_value(created.data.unwrap()["id"].clone()).unwrap();

        let err = delete_record(State(state.clone()), intruder_ctx.clone(), Path(id))
            .await
            .unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::NOT_FOUND);

        let err = get_record(State(state.clone()), intruder_ctx, Path(id))
            .await
            .unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::NOT_FOUND);

        // The owner can still delete it.
        delete_record(State(state.clone()), owner_ctx, Path(id))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn create_validation_maps_to_400() {
        let state = AppState::fake();
        let (ctx, _) = ctx_with_user();
        let payload = RecordInput {
            heart_rate: None,
            ..valid_input()
        };
        let err = create_record(State(state.clone()), ctx, Json(payload))
            .await
            .unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "heart rate is required");
    }

    #[tokio::test]
    async fn update_missing_record_reports_access_denied_style_message() {
        let state = AppState::fake();
        let (ctx, _) = ctx_with_user();
        let err = update_record(
            State(state.clone()),
            ctx,
            Path(Uuid::new_v4()),
            Json(valid_input()),
        )
        .await
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "health record not found or access denied"
        );
    }
}
