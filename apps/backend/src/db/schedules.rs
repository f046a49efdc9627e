//! Rotation schedules and their items

use chrono::NaiveDate;
use std::collections::HashSet;
use uuid::Uuid;

use super::Database;
use crate::error::{ApiError, Result};
use crate::models::*;
use study_core::PlannedItem;

const ITEM_COLUMNS: &str =
    "i.id, i.schedule_id, i.topic_id, i.study_date, i.status, i.version, i.updated_at";

/// A generated schedule ready to be written
#[derive(Debug)]
pub struct NewSchedule {
    pub user_id: Uuid,
    pub discipline_id: i64,
    pub start_date: NaiveDate,
    pub duration_weeks: i32,
    pub items: Vec<PlannedItem>,
    /// Schedule being replaced and the completed items it hands over
    pub replaces: Option<(Uuid, Vec<Uuid>)>,
}

impl Database {
    pub async fn get_schedule(
        &self,
        user_id: Uuid,
        schedule_id: Uuid,
    ) -> Result<Option<DbSchedule>> {
        let schedule = sqlx::query_as::<_, DbSchedule>(
            r#"
            SELECT id, user_id, rotation_discipline_id, start_date, duration_weeks, created_at
            FROM study_schedules
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(schedule_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(schedule)
    }

    pub async fn list_schedules(
        &self,
        user_id: Uuid,
        discipline_id: Option<i64>,
    ) -> Result<Vec<DbSchedule>> {
        let schedules = sqlx::query_as::<_, DbSchedule>(
            r#"
            SELECT id, user_id, rotation_discipline_id, start_date, duration_weeks, created_at
            FROM study_schedules
            WHERE user_id = $1 AND ($2::BIGINT IS NULL OR rotation_discipline_id = $2)
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .bind(discipline_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(schedules)
    }

    /// Items of a schedule ordered by date
    pub async fn get_schedule_items(&self, schedule_id: Uuid) -> Result<Vec<DbScheduleItem>> {
        let query = format!(
            "SELECT {ITEM_COLUMNS} FROM schedule_items i WHERE i.schedule_id = $1 \
             ORDER BY i.study_date, i.topic_id"
        );
        let items = sqlx::query_as::<_, DbScheduleItem>(&query)
            .bind(schedule_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(items)
    }

    /// Item owned by the user through its schedule
    pub async fn get_schedule_item(
        &self,
        user_id: Uuid,
        item_id: Uuid,
    ) -> Result<Option<DbScheduleItem>> {
        let query = format!(
            r#"
            SELECT {ITEM_COLUMNS}
            FROM schedule_items i
            JOIN study_schedules s ON s.id = i.schedule_id
            WHERE i.id = $1 AND s.user_id = $2
            "#
        );
        let item = sqlx::query_as::<_, DbScheduleItem>(&query)
            .bind(item_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(item)
    }

    /// Write a schedule and its items in one transaction.
    ///
    /// Every other schedule of the same discipline is removed, including the
    /// one being replaced, which must belong to that discipline. When replacing,
    /// the handed-over completed rows move to the new schedule unchanged; if the
    /// set of completed rows changed since it was read the whole write is
    /// rolled back with a conflict.
    pub async fn create_schedule(
        &self,
        schedule: &NewSchedule,
    ) -> Result<(DbSchedule, Vec<DbScheduleItem>)> {
        let mut tx = self.pool.begin().await?;

        let created = sqlx::query_as::<_, DbSchedule>(
            r#"
            INSERT INTO study_schedules (user_id, rotation_discipline_id, start_date, duration_weeks)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, rotation_discipline_id, start_date, duration_weeks, created_at
            "#,
        )
        .bind(schedule.user_id)
        .bind(schedule.discipline_id)
        .bind(schedule.start_date)
        .bind(schedule.duration_weeks)
        .fetch_one(&mut *tx)
        .await?;

        if let Some((old_id, carried)) = &schedule.replaces {
            let moved: Vec<Uuid> = sqlx::query_scalar(
                r#"
                UPDATE schedule_items
                SET schedule_id = $1
                WHERE schedule_id = $2 AND status = 'completed'
                RETURNING id
                "#,
            )
            .bind(created.id)
            .bind(old_id)
            .fetch_all(&mut *tx)
            .await?;

            let moved: HashSet<Uuid> = moved.into_iter().collect();
            let expected: HashSet<Uuid> = carried.iter().copied().collect();
            if moved != expected {
                return Err(ApiError::Conflict(
                    "Completed items changed during regeneration".to_string(),
                ));
            }
        }

        sqlx::query(
            r#"
            DELETE FROM study_schedules
            WHERE user_id = $1 AND rotation_discipline_id = $2 AND id <> $3
            "#,
        )
        .bind(schedule.user_id)
        .bind(schedule.discipline_id)
        .bind(created.id)
        .execute(&mut *tx)
        .await?;

        let topic_ids: Vec<i64> = schedule.items.iter().map(|i| i.topic_id).collect();
        let dates: Vec<NaiveDate> = schedule.items.iter().map(|i| i.study_date).collect();
        sqlx::query(
            r#"
            INSERT INTO schedule_items (schedule_id, topic_id, study_date)
            SELECT $1, t.topic_id, t.study_date
            FROM UNNEST($2::BIGINT[], $3::DATE[]) AS t(topic_id, study_date)
            "#,
        )
        .bind(created.id)
        .bind(&topic_ids)
        .bind(&dates)
        .execute(&mut *tx)
        .await?;

        let query = format!(
            "SELECT {ITEM_COLUMNS} FROM schedule_items i WHERE i.schedule_id = $1 \
             ORDER BY i.study_date, i.topic_id"
        );
        let items = sqlx::query_as::<_, DbScheduleItem>(&query)
            .bind(created.id)
            .fetch_all(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok((created, items))
    }

    /// Move an item to another date.
    ///
    /// With `expected_version` the write only lands on that version;
    /// without it the last write wins.
    pub async fn move_schedule_item(
        &self,
        item_id: Uuid,
        expected_version: Option<i32>,
        study_date: NaiveDate,
    ) -> Result<DbScheduleItem> {
        let query = format!(
            r#"
            UPDATE schedule_items i SET
                study_date = $3,
                version = i.version + 1,
                updated_at = NOW()
            WHERE i.id = $1 AND ($2::INT IS NULL OR i.version = $2)
            RETURNING {ITEM_COLUMNS}
            "#
        );
        let item = sqlx::query_as::<_, DbScheduleItem>(&query)
            .bind(item_id)
            .bind(expected_version)
            .bind(study_date)
            .fetch_optional(&self.pool)
            .await?;

        item.ok_or_else(|| item_write_missed(item_id, expected_version))
    }

    /// Flip an item between pending and completed in a single statement
    pub async fn toggle_schedule_item(
        &self,
        item_id: Uuid,
        expected_version: Option<i32>,
    ) -> Result<DbScheduleItem> {
        let query = format!(
            r#"
            UPDATE schedule_items i SET
                status = CASE WHEN i.status = $3 THEN $4 ELSE $3 END,
                version = i.version + 1,
                updated_at = NOW()
            WHERE i.id = $1 AND ($2::INT IS NULL OR i.version = $2)
            RETURNING {ITEM_COLUMNS}
            "#
        );
        let item = sqlx::query_as::<_, DbScheduleItem>(&query)
            .bind(item_id)
            .bind(expected_version)
            .bind(ItemStatus::Completed.as_str())
            .bind(ItemStatus::Completed.toggled().as_str())
            .fetch_optional(&self.pool)
            .await?;

        item.ok_or_else(|| item_write_missed(item_id, expected_version))
    }
}

/// Error for an item update that matched no row
fn item_write_missed(item_id: Uuid, expected_version: Option<i32>) -> ApiError {
    match expected_version {
        Some(version) => ApiError::Conflict(format!(
            "Schedule item {} is no longer at version {}",
            item_id, version
        )),
        None => ApiError::NotFound("Schedule item not found".to_string()),
    }
}

