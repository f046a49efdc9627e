//! Rating pipeline with compensating steps.
//!
//! A rating first claims the session's queue slot with a conditional write,
//! then appends a review event, rewrites the card's scheduling fields and
//! finally arms the undo snapshot. Each completed write is undone in reverse
//! order if a later one fails, so a failed rating leaves no partial state
//! behind. A rating that loses the claim has written nothing, and undo stays
//! unavailable until every write of the rating has landed.

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::db::Database;
use crate::error::Result;
use crate::models::*;
use study_core::session::xp_for;
use study_core::{rate_card, RatedCard};

/// Writes the pipeline needs from storage
#[allow(async_fn_in_trait)]
pub trait RatingStore {
    async fn insert_event(&self, event: &DbReviewEvent) -> Result<()>;
    async fn delete_event(&self, event_id: Uuid) -> Result<()>;
    async fn write_card(&self, card_id: i64, card: &CardSnapshot) -> Result<()>;
    /// Must fail with a conflict unless the session is at `expected_position`
    async fn write_session(
        &self,
        session_id: Uuid,
        expected_position: usize,
        progress: &SessionProgress,
        undo: Option<&UndoSnapshot>,
    ) -> Result<()>;
}

impl RatingStore for Database {
    async fn insert_event(&self, event: &DbReviewEvent) -> Result<()> {
        self.insert_review_event(event).await
    }

    async fn delete_event(&self, event_id: Uuid) -> Result<()> {
        self.delete_review_event(event_id).await
    }

    async fn write_card(&self, card_id: i64, card: &CardSnapshot) -> Result<()> {
        self.update_card_fields(card_id, card).await
    }

    async fn write_session(
        &self,
        session_id: Uuid,
        expected_position: usize,
        progress: &SessionProgress,
        undo: Option<&UndoSnapshot>,
    ) -> Result<()> {
        self.update_session_progress(session_id, expected_position, progress, undo)
            .await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    ClaimSession,
    InsertEvent,
    UpdateCard,
    ArmUndo,
}

/// Everything one rating writes, computed before any write is issued
#[derive(Debug, Clone)]
pub struct RatingPlan {
    pub event: DbReviewEvent,
    pub rated: RatedCard,
    pub progress: SessionProgress,
    pub undo: UndoSnapshot,
    undo_before: Option<UndoSnapshot>,
    session_id: Uuid,
}

impl RatingPlan {
    /// Compute the rating without touching storage.
    ///
    /// Fails when `card` is not the session's current card.
    pub fn prepare(
        session: &DbStudySession,
        card: &DbCard,
        quality: Quality,
        settings: &ReviewSettings,
        now: DateTime<Utc>,
        today: NaiveDate,
    ) -> Result<Self> {
        let before = session.to_progress();
        let progress = before.apply(card.id, quality)?;

        let card_before = card.to_snapshot();
        let rated = rate_card(&card_before, quality, settings, now, today);

        let event = DbReviewEvent {
            id: Uuid::new_v4(),
            user_id: session.user_id,
            flashcard_id: card.id,
            session_id: Some(session.id),
            difficulty: quality.as_str().to_string(),
            xp_earned: xp_for(quality) as i32,
            created_at: now,
        };

        Ok(Self {
            undo: UndoSnapshot {
                event_id: event.id,
                card_id: card.id,
                card_before,
                session_before: before,
            },
            undo_before: session.undo_snapshot().cloned(),
            event,
            rated,
            progress,
            session_id: session.id,
        })
    }

    fn position_before(&self) -> usize {
        self.undo.session_before.position
    }
}

/// Runs the writes of a [`RatingPlan`]
pub struct ReviewPipeline<'a, S: RatingStore> {
    store: &'a S,
    completed: Vec<Stage>,
}

impl<'a, S: RatingStore> ReviewPipeline<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            completed: Vec::new(),
        }
    }

    /// Apply every stage, compensating completed ones on failure.
    ///
    /// The error of the failing stage is returned even when a compensation
    /// also fails.
    pub async fn execute(mut self, plan: &RatingPlan) -> Result<()> {
        for stage in [
            Stage::ClaimSession,
            Stage::InsertEvent,
            Stage::UpdateCard,
            Stage::ArmUndo,
        ] {
            if let Err(err) = self.run(stage, plan).await {
                tracing::warn!(
                    event_id = %plan.event.id,
                    card_id = plan.undo.card_id,
                    ?stage,
                    "Rating failed, compensating: {}",
                    err
                );
                self.compensate(plan).await;
                return Err(err);
            }
            self.completed.push(stage);
        }
        Ok(())
    }

    async fn run(&self, stage: Stage, plan: &RatingPlan) -> Result<()> {
        match stage {
            // Clears the previous snapshot so undo cannot run mid-rating.
            Stage::ClaimSession => {
                self.store
                    .write_session(plan.session_id, plan.position_before(), &plan.progress, None)
                    .await
            }
            Stage::InsertEvent => self.store.insert_event(&plan.event).await,
            Stage::UpdateCard => {
                self.store
                    .write_card(plan.undo.card_id, &plan.rated.card)
                    .await
            }
            Stage::ArmUndo => {
                self.store
                    .write_session(
                        plan.session_id,
                        plan.progress.position,
                        &plan.progress,
                        Some(&plan.undo),
                    )
                    .await
            }
        }
    }

    async fn compensate(&mut self, plan: &RatingPlan) {
        while let Some(stage) = self.completed.pop() {
            let result = match stage {
                Stage::ClaimSession => {
                    self.store
                        .write_session(
                            plan.session_id,
                            plan.progress.position,
                            &plan.undo.session_before,
                            plan.undo_before.as_ref(),
                        )
                        .await
                }
                Stage::InsertEvent => self.store.delete_event(plan.event.id).await,
                Stage::UpdateCard => {
                    self.store
                        .write_card(plan.undo.card_id, &plan.undo.card_before)
                        .await
                }
                // Last stage, never completed before a failure.
                Stage::ArmUndo => Ok(()),
            };
            if let Err(err) = result {
                tracing::error!(
                    event_id = %plan.event.id,
                    ?stage,
                    "Compensation failed: {}",
                    err
                );
            }
        }
    }
}
