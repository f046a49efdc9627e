//! Read-side classification of dated work against "today".
//!
//! `today` is a local calendar date supplied by the caller.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DueStatus {
    Completed,
    Overdue,
    DueToday,
    Upcoming,
}

/// Classify a schedule item or a card's next review date.
pub fn classify(date: NaiveDate, completed: bool, today: NaiveDate) -> DueStatus {
    if completed {
        DueStatus::Completed
    } else if date < today {
        DueStatus::Overdue
    } else if date == today {
        DueStatus::DueToday
    } else {
        DueStatus::Upcoming
    }
}

/// A card with no next review date has never been scheduled and is due.
pub fn classify_card(next_review_date: Option<NaiveDate>, today: NaiveDate) -> DueStatus {
    match next_review_date {
        Some(date) => classify(date, false, today),
        None => DueStatus::DueToday,
    }
}
