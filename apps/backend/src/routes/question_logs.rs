//! Practice question log endpoint

use axum::{extract::State, http::StatusCode, Extension, Json};

use crate::error::{ApiError, Result};
use crate::models::{CreateQuestionLogRequest, DbQuestionLog};
use crate::routes::auth::AuthenticatedUser;
use crate::services::date_utils::local_today;
use crate::AppState;

/// POST /api/question-logs
pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Json(request): Json<CreateQuestionLogRequest>,
) -> Result<(StatusCode, Json<DbQuestionLog>)> {
    request.validate().map_err(ApiError::Validation)?;

    let logged_on = request
        .logged_on
        .unwrap_or_else(|| local_today(state.config.daily_reset_hour));
    let log = state
        .db
        .insert_question_log(auth.user_id, &request, logged_on)
        .await?;

    Ok((StatusCode::CREATED, Json(log)))
}
