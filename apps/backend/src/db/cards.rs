//! Error-notebook cards, review log and study sessions

use chrono::NaiveDate;
use sqlx::{types::Json, PgExecutor};
use uuid::Uuid;

use super::Database;
use crate::error::{ApiError, Result};
use crate::models::*;

const CARD_COLUMNS: &str = r#"id, user_id, topic_id, question_text, answer_text, notes, image_urls,
    stability, difficulty, state, lapses, "interval", last_reviewed_at, next_review_date,
    review_count, created_at, updated_at"#;

const SESSION_COLUMNS: &str = "id, user_id, queue, position, xp, streak, best_streak, \
    reviewed_count, undo_snapshot, created_at, updated_at";

/// Overwrite the scheduling fields of a card
async fn write_card_fields<'e, E>(executor: E, card_id: i64, card: &CardSnapshot) -> Result<u64>
where
    E: PgExecutor<'e>,
{
    let result = sqlx::query(
        r#"
        UPDATE error_notebook SET
            stability = $2,
            difficulty = $3,
            state = $4,
            lapses = $5,
            "interval" = $6,
            last_reviewed_at = $7,
            next_review_date = $8,
            review_count = $9,
            updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(card_id)
    .bind(card.stability)
    .bind(card.difficulty)
    .bind(card.status.to_code())
    .bind(card.lapses as i32)
    .bind(card.interval as i32)
    .bind(card.last_reviewed_at)
    .bind(card.next_review_date)
    .bind(card.review_count as i32)
    .execute(executor)
    .await?;

    Ok(result.rows_affected())
}

/// Write session progress and its undo snapshot
async fn write_session_progress<'e, E>(
    executor: E,
    session_id: Uuid,
    expected_position: Option<usize>,
    progress: &SessionProgress,
    undo: Option<&UndoSnapshot>,
) -> Result<u64>
where
    E: PgExecutor<'e>,
{
    let result = sqlx::query(
        r#"
        UPDATE study_sessions SET
            queue = $2,
            position = $3,
            xp = $4,
            streak = $5,
            best_streak = $6,
            reviewed_count = $7,
            undo_snapshot = $8,
            updated_at = NOW()
        WHERE id = $1 AND ($9::INT IS NULL OR position = $9)
        "#,
    )
    .bind(session_id)
    .bind(&progress.queue)
    .bind(progress.position as i32)
    .bind(progress.xp as i32)
    .bind(progress.streak as i32)
    .bind(progress.best_streak as i32)
    .bind(progress.reviewed_count as i32)
    .bind(undo.map(Json))
    .bind(expected_position.map(|p| p as i32))
    .execute(executor)
    .await?;

    Ok(result.rows_affected())
}

impl Database {
    // === Card Repository ===

    pub async fn create_card(&self, user_id: Uuid, request: &CreateCardRequest) -> Result<DbCard> {
        let query = format!(
            r#"
            INSERT INTO error_notebook
                (user_id, topic_id, question_text, answer_text, notes, image_urls, "interval")
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {CARD_COLUMNS}
            "#
        );
        let card = sqlx::query_as::<_, DbCard>(&query)
            .bind(user_id)
            .bind(request.topic_id)
            .bind(&request.question_text)
            .bind(&request.answer_text)
            .bind(&request.notes)
            .bind(&request.image_urls)
            .bind(request.interval.unwrap_or(0).max(0))
            .fetch_one(&self.pool)
            .await?;

        Ok(card)
    }

    /// Get a card owned by the user
    pub async fn get_card(&self, user_id: Uuid, card_id: i64) -> Result<Option<DbCard>> {
        let query = format!(
            "SELECT {CARD_COLUMNS} FROM error_notebook WHERE id = $1 AND user_id = $2"
        );
        let card = sqlx::query_as::<_, DbCard>(&query)
            .bind(card_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(card)
    }

    /// Cards scheduled on or before `today`, unscheduled cards first
    pub async fn get_due_cards(
        &self,
        user_id: Uuid,
        today: NaiveDate,
        limit: i64,
    ) -> Result<Vec<DbCard>> {
        let query = format!(
            r#"
            SELECT {CARD_COLUMNS}
            FROM error_notebook
            WHERE user_id = $1 AND (next_review_date IS NULL OR next_review_date <= $2)
            ORDER BY next_review_date NULLS FIRST, id
            LIMIT $3
            "#
        );
        let cards = sqlx::query_as::<_, DbCard>(&query)
            .bind(user_id)
            .bind(today)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(cards)
    }

    /// Overwrite the scheduling fields of a card
    pub async fn update_card_fields(&self, card_id: i64, card: &CardSnapshot) -> Result<()> {
        let updated = write_card_fields(&self.pool, card_id, card).await?;
        if updated == 0 {
            return Err(ApiError::NotFound(format!("Card {} not found", card_id)));
        }
        Ok(())
    }

    // === Review Log ===

    pub async fn insert_review_event(&self, event: &DbReviewEvent) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO flashcard_reviews
                (id, user_id, flashcard_id, session_id, difficulty, xp_earned, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(event.id)
        .bind(event.user_id)
        .bind(event.flashcard_id)
        .bind(event.session_id)
        .bind(&event.difficulty)
        .bind(event.xp_earned)
        .bind(event.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn delete_review_event(&self, event_id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM flashcard_reviews WHERE id = $1")
            .bind(event_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn get_review_event(&self, event_id: Uuid) -> Result<Option<DbReviewEvent>> {
        let event = sqlx::query_as::<_, DbReviewEvent>(
            r#"
            SELECT id, user_id, flashcard_id, session_id, difficulty, xp_earned, created_at
            FROM flashcard_reviews
            WHERE id = $1
            "#,
        )
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(event)
    }

    // === Study Sessions ===

    pub async fn create_session(&self, user_id: Uuid, queue: &[i64]) -> Result<DbStudySession> {
        let query = format!(
            "INSERT INTO study_sessions (user_id, queue) VALUES ($1, $2) \
             RETURNING {SESSION_COLUMNS}"
        );
        let session = sqlx::query_as::<_, DbStudySession>(&query)
            .bind(user_id)
            .bind(queue)
            .fetch_one(&self.pool)
            .await?;

        Ok(session)
    }

    pub async fn get_session(
        &self,
        user_id: Uuid,
        session_id: Uuid,
    ) -> Result<Option<DbStudySession>> {
        let query = format!(
            "SELECT {SESSION_COLUMNS} FROM study_sessions WHERE id = $1 AND user_id = $2"
        );
        let session = sqlx::query_as::<_, DbStudySession>(&query)
            .bind(session_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(session)
    }

    /// Store session progress and its undo snapshot.
    ///
    /// Fails with a conflict when the session is no longer at
    /// `expected_position`, which is how a rating claims its queue slot.
    pub async fn update_session_progress(
        &self,
        session_id: Uuid,
        expected_position: usize,
        progress: &SessionProgress,
        undo: Option<&UndoSnapshot>,
    ) -> Result<()> {
        let updated = write_session_progress(
            &self.pool,
            session_id,
            Some(expected_position),
            progress,
            undo,
        )
        .await?;

        if updated == 0 {
            return Err(ApiError::Conflict(
                "Session was advanced by another request".to_string(),
            ));
        }
        Ok(())
    }

    /// Reverse the most recent rating of a session in one transaction.
    ///
    /// Deletes the review event, restores the card and session from the
    /// snapshot and clears it. Returns the snapshot that was applied.
    pub async fn undo_last_rating(&self, user_id: Uuid, session_id: Uuid) -> Result<UndoSnapshot> {
        let mut tx = self.pool.begin().await?;

        let query = format!(
            "SELECT {SESSION_COLUMNS} FROM study_sessions WHERE id = $1 AND user_id = $2 FOR UPDATE"
        );
        let session = sqlx::query_as::<_, DbStudySession>(&query)
            .bind(session_id)
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| ApiError::NotFound("Session not found".to_string()))?;

        let snapshot = session
            .undo_snapshot
            .map(|s| s.0)
            .ok_or_else(|| ApiError::Conflict("Nothing to undo".to_string()))?;

        sqlx::query("DELETE FROM flashcard_reviews WHERE id = $1")
            .bind(snapshot.event_id)
            .execute(&mut *tx)
            .await?;

        write_card_fields(&mut *tx, snapshot.card_id, &snapshot.card_before).await?;
        write_session_progress(&mut *tx, session_id, None, &snapshot.session_before, None)
            .await?;

        tx.commit().await?;
        Ok(snapshot)
    }
}
