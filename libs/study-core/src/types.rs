//! Core types shared by the scheduler, the planner and the backend.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of an error-notebook card.
pub type CardId = i64;

/// Identifier of a study topic.
pub type TopicId = i64;

/// Memory-model position of a card.
///
/// `Learning` and `Relearning` share the persisted code 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardStatus {
    #[default]
    New,
    Learning,
    Review,
    Relearning,
}

impl CardStatus {
    /// Persisted state code: New=0, Learning/Relearning=1, Review=2.
    pub fn to_code(self) -> i16 {
        match self {
            Self::New => 0,
            Self::Learning | Self::Relearning => 1,
            Self::Review => 2,
        }
    }

    /// Decode a persisted state code. Code 1 is `Relearning` once the card
    /// has lapsed at least once, `Learning` otherwise.
    pub fn from_code(code: i16, lapses: u32) -> Self {
        match code {
            1 if lapses > 0 => Self::Relearning,
            1 => Self::Learning,
            2 => Self::Review,
            _ => Self::New,
        }
    }
}

/// Recall-quality rating. Only three buttons exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quality {
    Wrong,
    Hard,
    Easy,
}

impl Quality {
    /// Discretized quality value (1, 3 or 5).
    pub fn to_value(self) -> u8 {
        match self {
            Self::Wrong => 1,
            Self::Hard => 3,
            Self::Easy => 5,
        }
    }

    /// Create from a quality value.
    pub fn from_value(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::Wrong),
            3 => Some(Self::Hard),
            5 => Some(Self::Easy),
            _ => None,
        }
    }

    /// FSRS grade used for weight indexing: Again=1, Hard=2, Easy=4.
    pub fn grade(self) -> u8 {
        match self {
            Self::Wrong => 1,
            Self::Hard => 2,
            Self::Easy => 4,
        }
    }

    /// Label stored in the review log.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Wrong => "wrong",
            Self::Hard => "hard",
            Self::Easy => "easy",
        }
    }

    /// Parse a review-log label.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "wrong" => Some(Self::Wrong),
            "hard" => Some(Self::Hard),
            "easy" => Some(Self::Easy),
            _ => None,
        }
    }

    pub fn is_lapse(self) -> bool {
        self == Self::Wrong
    }
}

/// Scheduling fields of a review card, exactly as stored.
///
/// This is the unit captured before a rating for undo.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CardSnapshot {
    pub stability: Option<f64>,
    pub difficulty: Option<f64>,
    pub status: CardStatus,
    pub lapses: u32,
    /// Legacy interval in days, kept up to date for pre-FSRS readers.
    pub interval: u32,
    pub last_reviewed_at: Option<DateTime<Utc>>,
    pub next_review_date: Option<NaiveDate>,
    pub review_count: u32,
}

/// Status of a rotation schedule item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    #[default]
    Pending,
    Completed,
}

impl ItemStatus {
    pub fn toggled(self) -> Self {
        match self {
            Self::Pending => Self::Completed,
            Self::Completed => Self::Pending,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }
}
