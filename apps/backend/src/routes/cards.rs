//! Error-notebook card endpoints

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;

use crate::error::{ApiError, Result};
use crate::models::*;
use crate::routes::auth::AuthenticatedUser;
use crate::AppState;

pub const DEFAULT_DUE_LIMIT: i64 = 100;
pub const MAX_DUE_LIMIT: i64 = 500;

pub(crate) fn due_limit(requested: Option<i64>) -> i64 {
    requested
        .unwrap_or(DEFAULT_DUE_LIMIT)
        .clamp(1, MAX_DUE_LIMIT)
}

/// POST /api/cards
pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Json(request): Json<CreateCardRequest>,
) -> Result<(StatusCode, Json<ApiCard>)> {
    if request.question_text.trim().is_empty() || request.answer_text.trim().is_empty() {
        return Err(ApiError::Validation(
            "question_text and answer_text must not be empty".to_string(),
        ));
    }
    if request.interval.is_some_and(|i| i < 0) {
        return Err(ApiError::Validation(
            "interval must not be negative".to_string(),
        ));
    }

    let card = state.db.create_card(auth.user_id, &request).await?;
    Ok((
        StatusCode::CREATED,
        Json(card.to_api_card(state.today(), Utc::now())),
    ))
}

/// GET /api/cards/due
/// Cards due on or before the adjusted today
pub async fn due(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Query(query): Query<DueCardsQuery>,
) -> Result<Json<DueCardsResponse>> {
    let today = state.today();
    let now = Utc::now();
    let cards = state
        .db
        .get_due_cards(auth.user_id, today, due_limit(query.limit))
        .await?;

    Ok(Json(DueCardsResponse {
        today,
        cards: cards.iter().map(|c| c.to_api_card(today, now)).collect(),
    }))
}
