//! Study session endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;
use uuid::Uuid;

use crate::error::{ApiError, Result};
use crate::models::*;
use crate::routes::auth::AuthenticatedUser;
use crate::routes::cards::due_limit;
use crate::services::review_pipeline::{RatingPlan, ReviewPipeline};
use crate::AppState;

async fn load_session(
    state: &AppState,
    user_id: Uuid,
    session_id: Uuid,
) -> Result<DbStudySession> {
    state
        .db
        .get_session(user_id, session_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Session not found".to_string()))
}

async fn load_card(state: &AppState, user_id: Uuid, card_id: i64) -> Result<DbCard> {
    state
        .db
        .get_card(user_id, card_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Card {} not found", card_id)))
}

/// POST /api/sessions
/// Starts a session over the cards currently due
pub async fn start(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    request: Option<Json<StartSessionRequest>>,
) -> Result<(StatusCode, Json<SessionResponse>)> {
    let limit = due_limit(request.and_then(|Json(r)| r.limit));
    let queue: Vec<i64> = state
        .db
        .get_due_cards(auth.user_id, state.today(), limit)
        .await?
        .iter()
        .map(|c| c.id)
        .collect();

    let session = state.db.create_session(auth.user_id, &queue).await?;
    tracing::info!(session_id = %session.id, cards = queue.len(), "Started study session");

    Ok((StatusCode::CREATED, Json(session.to_api_session())))
}

/// GET /api/sessions/{id}
pub async fn get(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SessionResponse>> {
    let session = load_session(&state, auth.user_id, session_id).await?;
    Ok(Json(session.to_api_session()))
}

/// POST /api/sessions/{id}/rate
/// Rates the current card and advances the session
pub async fn rate(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<RateCardRequest>,
) -> Result<Json<RateCardResponse>> {
    let session = load_session(&state, auth.user_id, session_id).await?;
    let card = load_card(&state, auth.user_id, request.card_id).await?;
    let settings = state.db.get_settings(auth.user_id).await?;

    let now = Utc::now();
    let today = state.today();
    let plan = RatingPlan::prepare(
        &session,
        &card,
        request.quality,
        &settings.to_review_settings(),
        now,
        today,
    )?;

    ReviewPipeline::new(state.db.as_ref()).execute(&plan).await?;

    if plan.rated.legacy_seeded {
        tracing::info!(card_id = card.id, "Migrated legacy card on first review");
    }

    let card = load_card(&state, auth.user_id, card.id).await?;
    let session = load_session(&state, auth.user_id, session_id).await?;

    Ok(Json(RateCardResponse {
        event_id: plan.event.id,
        xp_earned: plan.event.xp_earned.max(0) as u32,
        outcome: plan.rated.outcome,
        card: card.to_api_card(today, now),
        session: session.to_api_session(),
    }))
}

/// POST /api/sessions/{id}/undo
/// Reverses the most recent rating of the session
pub async fn undo(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<UndoResponse>> {
    let snapshot = state.db.undo_last_rating(auth.user_id, session_id).await?;

    tracing::info!(
        session_id = %session_id,
        event_id = %snapshot.event_id,
        card_id = snapshot.card_id,
        "Undid last rating"
    );

    let card = load_card(&state, auth.user_id, snapshot.card_id).await?;
    let session = load_session(&state, auth.user_id, session_id).await?;

    Ok(Json(UndoResponse {
        removed_event_id: snapshot.event_id,
        card: card.to_api_card(state.today(), Utc::now()),
        session: session.to_api_session(),
    }))
}
