//! Study session progress and the single-step undo snapshot.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::SessionError;
use crate::types::{CardId, CardSnapshot, Quality};

pub const XP_EASY: u32 = 10;
pub const XP_HARD: u32 = 5;
pub const XP_WRONG: u32 = 1;

/// Experience awarded for a rating.
pub fn xp_for(quality: Quality) -> u32 {
    match quality {
        Quality::Easy => XP_EASY,
        Quality::Hard => XP_HARD,
        Quality::Wrong => XP_WRONG,
    }
}

/// Counters and queue position of a study session.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SessionProgress {
    pub queue: Vec<CardId>,
    pub position: usize,
    pub xp: u32,
    pub streak: u32,
    pub best_streak: u32,
    pub reviewed_count: u32,
}

impl SessionProgress {
    pub fn new(queue: Vec<CardId>) -> Self {
        Self {
            queue,
            ..Self::default()
        }
    }

    pub fn current_card(&self) -> Option<CardId> {
        self.queue.get(self.position).copied()
    }

    pub fn remaining(&self) -> usize {
        self.queue.len().saturating_sub(self.position)
    }

    pub fn is_finished(&self) -> bool {
        self.current_card().is_none()
    }

    /// Progress after rating the current card.
    ///
    /// A Wrong card goes back to the end of the queue and breaks the streak.
    pub fn apply(&self, card_id: CardId, quality: Quality) -> Result<Self, SessionError> {
        let expected = self.current_card().ok_or(SessionError::Finished)?;
        if expected != card_id {
            return Err(SessionError::NotCurrentCard {
                expected,
                actual: card_id,
            });
        }

        let mut next = self.clone();
        next.position += 1;
        next.reviewed_count += 1;
        next.xp += xp_for(quality);
        if quality.is_lapse() {
            next.streak = 0;
            next.queue.push(card_id);
        } else {
            next.streak += 1;
            next.best_streak = next.best_streak.max(next.streak);
        }
        Ok(next)
    }
}

/// Everything needed to reverse the most recent rating of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UndoSnapshot {
    pub event_id: Uuid,
    pub card_id: CardId,
    pub card_before: CardSnapshot,
    pub session_before: SessionProgress,
}
