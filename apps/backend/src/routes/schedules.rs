//! Rotation schedule endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use uuid::Uuid;

use crate::error::{ApiError, Result};
use crate::models::*;
use crate::routes::auth::AuthenticatedUser;
use crate::services::rotation;
use crate::AppState;

/// POST /api/schedules
/// Generates a schedule, or regenerates one with `regenerate_from`
pub async fn generate(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Json(request): Json<GenerateScheduleRequest>,
) -> Result<(StatusCode, Json<ScheduleResponse>)> {
    let (schedule, items) = rotation::generate_schedule(&state.db, auth.user_id, &request).await?;
    Ok((
        StatusCode::CREATED,
        Json(ScheduleResponse::new(schedule, &items, state.today())),
    ))
}

/// GET /api/schedules
pub async fn list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Query(query): Query<ScheduleListQuery>,
) -> Result<Json<ScheduleListResponse>> {
    let schedules = state
        .db
        .list_schedules(auth.user_id, query.discipline_id)
        .await?;
    Ok(Json(ScheduleListResponse { schedules }))
}

/// GET /api/schedules/{id}
pub async fn get(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(schedule_id): Path<Uuid>,
) -> Result<Json<ScheduleResponse>> {
    let schedule = state
        .db
        .get_schedule(auth.user_id, schedule_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Schedule not found".to_string()))?;
    let items = state.db.get_schedule_items(schedule.id).await?;

    Ok(Json(ScheduleResponse::new(schedule, &items, state.today())))
}

/// PUT /api/schedule-items/{id}/date
pub async fn move_item(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(item_id): Path<Uuid>,
    Json(request): Json<MoveItemRequest>,
) -> Result<Json<ApiScheduleItem>> {
    let item = rotation::move_item(
        &state.db,
        auth.user_id,
        item_id,
        request.study_date,
        request.expected_version,
    )
    .await?;
    Ok(Json(item.to_api_item(state.today())))
}

/// POST /api/schedule-items/{id}/toggle
pub async fn toggle_item(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(item_id): Path<Uuid>,
    request: Option<Json<ToggleItemRequest>>,
) -> Result<Json<ApiScheduleItem>> {
    let expected_version = request.and_then(|Json(r)| r.expected_version);
    let item = rotation::toggle_item(&state.db, auth.user_id, item_id, expected_version).await?;
    Ok(Json(item.to_api_item(state.today())))
}
