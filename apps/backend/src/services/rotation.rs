//! Rotation schedule orchestration over the planner

use chrono::NaiveDate;
use std::collections::HashSet;
use uuid::Uuid;

use crate::db::{Database, NewSchedule};
use crate::error::{ApiError, Result};
use crate::models::*;

/// Generate a schedule for a discipline, or regenerate one keeping its
/// completed items.
pub async fn generate_schedule(
    db: &Database,
    user_id: Uuid,
    request: &GenerateScheduleRequest,
) -> Result<(DbSchedule, Vec<DbScheduleItem>)> {
    if !db.discipline_exists(request.discipline_id).await? {
        return Err(ApiError::NotFound(format!(
            "Discipline {} not found",
            request.discipline_id
        )));
    }

    let topics: Vec<i64> = db
        .get_discipline_topics(request.discipline_id)
        .await?
        .into_iter()
        .map(|t| t.id)
        .collect();

    let mut completed_items = Vec::new();
    if let Some(old_id) = request.regenerate_from {
        let old = db
            .get_schedule(user_id, old_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Schedule not found".to_string()))?;
        if old.rotation_discipline_id != request.discipline_id {
            return Err(ApiError::BadRequest(format!(
                "Schedule {} belongs to another discipline",
                old_id
            )));
        }
        completed_items = db
            .get_schedule_items(old.id)
            .await?
            .into_iter()
            .filter(|i| i.item_status() == ItemStatus::Completed)
            .collect();
    }

    let completed: HashSet<i64> = completed_items.iter().map(|i| i.topic_id).collect();
    let plan = study_core::generate(
        &topics,
        &request.availability,
        request.start_date,
        &completed,
    )?;
    let ends_on = plan.last_date();

    let schedule = NewSchedule {
        user_id,
        discipline_id: request.discipline_id,
        start_date: request.start_date,
        duration_weeks: plan.duration_weeks as i32,
        items: plan.items,
        replaces: request
            .regenerate_from
            .map(|id| (id, completed_items.iter().map(|i| i.id).collect())),
    };
    let (created, items) = db.create_schedule(&schedule).await?;

    tracing::info!(
        schedule_id = %created.id,
        discipline_id = request.discipline_id,
        items = items.len(),
        carried_over = completed_items.len(),
        duration_weeks = created.duration_weeks,
        ends_on = ?ends_on,
        "Generated rotation schedule"
    );

    Ok((created, items))
}

/// Reject a write made against a stale copy of the item
fn check_version(item: &DbScheduleItem, expected: Option<i32>) -> Result<()> {
    match expected {
        Some(v) if v != item.version => Err(ApiError::Conflict(format!(
            "Schedule item {} is at version {}, not {}",
            item.id, item.version, v
        ))),
        _ => Ok(()),
    }
}

async fn owned_item(db: &Database, user_id: Uuid, item_id: Uuid) -> Result<DbScheduleItem> {
    db.get_schedule_item(user_id, item_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Schedule item not found".to_string()))
}

/// Move an item to another date. Capacity is not re-checked.
pub async fn move_item(
    db: &Database,
    user_id: Uuid,
    item_id: Uuid,
    study_date: NaiveDate,
    expected_version: Option<i32>,
) -> Result<DbScheduleItem> {
    let item = owned_item(db, user_id, item_id).await?;
    check_version(&item, expected_version)?;
    db.move_schedule_item(item.id, expected_version, study_date)
        .await
}

/// Flip an item between pending and completed
pub async fn toggle_item(
    db: &Database,
    user_id: Uuid,
    item_id: Uuid,
    expected_version: Option<i32>,
) -> Result<DbScheduleItem> {
    let item = owned_item(db, user_id, item_id).await?;
    check_version(&item, expected_version)?;
    db.toggle_schedule_item(item.id, expected_version).await
}
