//! Applying a rating to a stored card.
//!
//! Resolves legacy cards, runs the scheduler and produces the card fields to
//! persist. Lapse and review counters live here, not in the scheduler.

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::algorithm::fsrs::{Fsrs, FsrsParams, DEFAULT_RETENTION};
use crate::algorithm::{calculate_next_review, MemoryState, ReviewOutcome};
use crate::types::{CardSnapshot, Quality};

/// User-level scheduler settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewSettings {
    pub retention: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<FsrsParams>,
}

impl Default for ReviewSettings {
    fn default() -> Self {
        Self {
            retention: DEFAULT_RETENTION,
            params: None,
        }
    }
}

impl ReviewSettings {
    /// Weights in effect: the custom vector or the defaults.
    pub fn effective_params(&self) -> FsrsParams {
        self.params.clone().unwrap_or_default()
    }
}

/// A card after one rating.
#[derive(Debug, Clone, PartialEq)]
pub struct RatedCard {
    pub card: CardSnapshot,
    pub outcome: ReviewOutcome,
    /// The inputs came from the legacy interval.
    pub legacy_seeded: bool,
}

/// Fractional days between the last review and `now`, 0 if never reviewed.
pub fn days_since(last_reviewed_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> f64 {
    last_reviewed_at
        .map(|last| (now - last).num_seconds() as f64 / 86400.0)
        .unwrap_or(0.0)
        .max(0.0)
}

/// Rate `card`, returning the fields to persist. `card` is not modified.
pub fn rate_card(
    card: &CardSnapshot,
    quality: Quality,
    settings: &ReviewSettings,
    now: DateTime<Utc>,
    today: NaiveDate,
) -> RatedCard {
    let memory =
        MemoryState::from_card_fields(card.stability, card.difficulty, card.status, card.interval);

    let outcome = calculate_next_review(
        quality,
        memory.stability,
        memory.difficulty,
        memory.status,
        days_since(card.last_reviewed_at, now),
        settings.retention,
        settings.params.as_ref(),
    );

    let next_review_date = today
        .checked_add_days(Days::new(outcome.interval as u64))
        .unwrap_or(today);

    RatedCard {
        card: CardSnapshot {
            stability: Some(outcome.stability),
            difficulty: Some(outcome.difficulty),
            status: outcome.state,
            lapses: card.lapses + u32::from(quality.is_lapse()),
            interval: outcome.interval,
            last_reviewed_at: Some(now),
            next_review_date: Some(next_review_date),
            review_count: card.review_count + 1,
        },
        outcome,
        legacy_seeded: MemoryState::is_legacy_seed(card.stability, card.interval),
    }
}

/// Current recall probability of a stored card, `None` for unseen cards.
pub fn current_retrievability(card: &CardSnapshot, now: DateTime<Utc>) -> Option<f64> {
    let memory =
        MemoryState::from_card_fields(card.stability, card.difficulty, card.status, card.interval);
    if memory.stability <= 0.0 {
        return None;
    }
    Some(Fsrs::default().retrievability(days_since(card.last_reviewed_at, now), memory.stability))
}
