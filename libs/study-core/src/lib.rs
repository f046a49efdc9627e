//! Core study library used by the backend.
//!
//! Provides:
//! - FSRS review scheduler with legacy-card migration
//! - Rating application and study session progress with single-step undo
//! - Rotation planner that spreads topics over weekday capacities
//! - Due classification against a local "today"

pub mod algorithm;
pub mod due;
pub mod error;
pub mod planner;
pub mod review;
pub mod session;
pub mod types;

pub use algorithm::{calculate_next_review, FsrsParams, MemoryState, ReviewOutcome};
pub use due::{classify, DueStatus};
pub use error::{PlanError, Result, SessionError};
pub use planner::{generate, GeneratedPlan, PlannedItem, WeeklyAvailability};
pub use review::{rate_card, RatedCard, ReviewSettings};
pub use session::{SessionProgress, UndoSnapshot};
pub use types::{CardId, CardSnapshot, CardStatus, ItemStatus, Quality, TopicId};
