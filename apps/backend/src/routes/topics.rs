//! Reference data endpoints

use axum::{
    extract::{Path, State},
    Json,
};

use crate::error::{ApiError, Result};
use crate::models::Topic;
use crate::AppState;

/// GET /api/disciplines/{id}/topics
/// Topic pool of a discipline in planning order
pub async fn list(
    State(state): State<AppState>,
    Path(discipline_id): Path<i64>,
) -> Result<Json<Vec<Topic>>> {
    if !state.db.discipline_exists(discipline_id).await? {
        return Err(ApiError::NotFound(format!(
            "Discipline {} not found",
            discipline_id
        )));
    }
    Ok(Json(state.db.get_discipline_topics(discipline_id).await?))
}
