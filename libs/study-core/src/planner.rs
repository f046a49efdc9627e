//! Rotation planner: spreads a discipline's topics over study weekdays.
//!
//! Topics keep their pool order. Each available day takes up to its weekday
//! capacity; unavailable days are skipped without consuming anything.

use std::collections::{HashMap, HashSet};

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::{PlanError, Result};
use crate::types::TopicId;

/// Upper bound on calendar days walked by [`generate`].
pub const MAX_PLANNING_DAYS: u32 = 1000;

/// Per-weekday topic capacity. Weekdays with capacity 0 are unavailable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "HashMap<Weekday, u32>",
    into = "HashMap<Weekday, u32>"
)]
pub struct WeeklyAvailability {
    capacity: [u32; 7],
}

impl WeeklyAvailability {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`WeeklyAvailability::set`].
    pub fn with(mut self, day: Weekday, capacity: u32) -> Self {
        self.set(day, capacity);
        self
    }

    pub fn set(&mut self, day: Weekday, capacity: u32) {
        self.capacity[day.num_days_from_monday() as usize] = capacity;
    }

    pub fn capacity(&self, day: Weekday) -> u32 {
        self.capacity[day.num_days_from_monday() as usize]
    }

    pub fn is_available(&self, day: Weekday) -> bool {
        self.capacity(day) > 0
    }

    /// Sum of all weekday capacities.
    pub fn weekly_total(&self) -> u32 {
        self.capacity.iter().sum()
    }
}

impl From<HashMap<Weekday, u32>> for WeeklyAvailability {
    fn from(map: HashMap<Weekday, u32>) -> Self {
        map.into_iter()
            .fold(Self::new(), |acc, (day, cap)| acc.with(day, cap))
    }
}

impl From<WeeklyAvailability> for HashMap<Weekday, u32> {
    fn from(availability: WeeklyAvailability) -> Self {
        ALL_WEEKDAYS
            .iter()
            .filter(|day| availability.is_available(**day))
            .map(|day| (*day, availability.capacity(*day)))
            .collect()
    }
}

const ALL_WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// One topic placed on a calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedItem {
    pub topic_id: TopicId,
    pub study_date: NaiveDate,
}

/// Output of [`generate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedPlan {
    /// Items in assignment order; dates are non-decreasing.
    pub items: Vec<PlannedItem>,
    pub duration_weeks: u32,
}

impl GeneratedPlan {
    pub fn last_date(&self) -> Option<NaiveDate> {
        self.items.last().map(|item| item.study_date)
    }
}

/// Assign every topic not in `completed` to a date on or after `start_date`.
///
/// Fails instead of truncating: an empty pool, an availability without any
/// capacity, or a pool that does not fit in [`MAX_PLANNING_DAYS`] days are
/// all reported as [`PlanError`].
pub fn generate(
    topics: &[TopicId],
    availability: &WeeklyAvailability,
    start_date: NaiveDate,
    completed: &HashSet<TopicId>,
) -> Result<GeneratedPlan> {
    if topics.is_empty() {
        return Err(PlanError::NoTopics);
    }

    let pool: Vec<TopicId> = topics
        .iter()
        .copied()
        .filter(|topic| !completed.contains(topic))
        .collect();
    if pool.is_empty() {
        return Err(PlanError::NothingToSchedule);
    }
    if availability.weekly_total() == 0 {
        return Err(PlanError::NoCapacity);
    }

    let mut remaining = pool.iter().copied();
    let mut items = Vec::with_capacity(pool.len());
    let mut day = Some(start_date);

    for _ in 0..MAX_PLANNING_DAYS {
        let Some(date) = day else { break };
        let capacity = availability.capacity(date.weekday()) as usize;
        items.extend(remaining.by_ref().take(capacity).map(|topic_id| PlannedItem {
            topic_id,
            study_date: date,
        }));
        if items.len() == pool.len() {
            break;
        }
        day = date.succ_opt();
    }

    if items.len() < pool.len() {
        return Err(PlanError::HorizonExceeded {
            days: MAX_PLANNING_DAYS,
            placed: items.len(),
            remaining: pool.len() - items.len(),
        });
    }

    let last = items.last().map_or(start_date, |item| item.study_date);
    Ok(GeneratedPlan {
        duration_weeks: duration_weeks(start_date, last),
        items,
    })
}

/// Whole weeks spanned from `start` through `last`, inclusive, at least 1.
pub fn duration_weeks(start: NaiveDate, last: NaiveDate) -> u32 {
    let days = (last - start).num_days() + 1;
    if days <= 0 {
        return 1;
    }
    ((days as u32).div_ceil(7)).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn topics(n: i64) -> Vec<TopicId> {
        (1..=n).collect()
    }

    fn mon_wed() -> WeeklyAvailability {
        WeeklyAvailability::new()
            .with(Weekday::Mon, 2)
            .with(Weekday::Wed, 3)
    }

    #[test]
    fn respects_weekday_capacity() {
        // 2024-01-01 is a Monday.
        let plan = generate(&topics(10), &mon_wed(), date(2024, 1, 1), &HashSet::new()).unwrap();

        assert_eq!(plan.items.len(), 10);
        let on = |d: NaiveDate| {
            plan.items
                .iter()
                .filter(|item| item.study_date == d)
                .count()
        };
        assert_eq!(on(date(2024, 1, 1)), 2);
        assert_eq!(on(date(2024, 1, 3)), 3);
        assert_eq!(on(date(2024, 1, 8)), 2);
        assert_eq!(on(date(2024, 1, 10)), 3);

        for item in &plan.items {
            let weekday = item.study_date.weekday();
            assert!(
                weekday == Weekday::Mon || weekday == Weekday::Wed,
                "topic {} landed on {weekday}",
                item.topic_id
            );
        }
    }

    #[test]
    fn keeps_pool_order_and_monotonic_dates() {
        let plan = generate(&topics(10), &mon_wed(), date(2024, 1, 1), &HashSet::new()).unwrap();

        let ids: Vec<TopicId> = plan.items.iter().map(|item| item.topic_id).collect();
        assert_eq!(ids, topics(10));
        assert!(plan
            .items
            .windows(2)
            .all(|pair| pair[0].study_date <= pair[1].study_date));
    }

    #[test]
    fn skips_unavailable_start_day() {
        // 2024-01-02 is a Tuesday; first slot is Wednesday.
        let plan = generate(&topics(1), &mon_wed(), date(2024, 1, 2), &HashSet::new()).unwrap();
        assert_eq!(plan.items[0].study_date, date(2024, 1, 3));
        assert_eq!(plan.duration_weeks, 1);
    }

    #[test]
    fn excludes_completed_topics() {
        let completed: HashSet<TopicId> = [1, 4].into_iter().collect();
        let plan = generate(&topics(6), &mon_wed(), date(2024, 1, 1), &completed).unwrap();

        let ids: Vec<TopicId> = plan.items.iter().map(|item| item.topic_id).collect();
        assert_eq!(ids, vec![2, 3, 5, 6]);
    }

    #[test]
    fn regeneration_with_new_pattern_never_reemits_completed() {
        let completed: HashSet<TopicId> = [1].into_iter().collect();
        let availability = WeeklyAvailability::new()
            .with(Weekday::Tue, 1)
            .with(Weekday::Fri, 4);
        let plan = generate(&topics(10), &availability, date(2024, 2, 5), &completed).unwrap();

        assert_eq!(plan.items.len(), 9);
        assert!(plan.items.iter().all(|item| item.topic_id != 1));
    }

    #[test]
    fn empty_topic_list_is_an_error() {
        let err = generate(&[], &mon_wed(), date(2024, 1, 1), &HashSet::new()).unwrap_err();
        assert_eq!(err, PlanError::NoTopics);
        assert_eq!(err.to_string(), "no topics found");
    }

    #[test]
    fn all_completed_is_an_error() {
        let completed: HashSet<TopicId> = topics(3).into_iter().collect();
        let err = generate(&topics(3), &mon_wed(), date(2024, 1, 1), &completed).unwrap_err();
        assert_eq!(err, PlanError::NothingToSchedule);
    }

    #[test]
    fn zero_capacity_is_an_error() {
        let availability = WeeklyAvailability::new().with(Weekday::Mon, 0);
        let err =
            generate(&topics(3), &availability, date(2024, 1, 1), &HashSet::new()).unwrap_err();
        assert_eq!(err, PlanError::NoCapacity);
    }

    #[test]
    fn oversized_pool_reports_horizon() {
        // One slot per week fits 143 topics in 1000 days.
        let availability = WeeklyAvailability::new().with(Weekday::Mon, 1);
        let err =
            generate(&topics(200), &availability, date(2024, 1, 1), &HashSet::new()).unwrap_err();
        assert_eq!(
            err,
            PlanError::HorizonExceeded {
                days: MAX_PLANNING_DAYS,
                placed: 143,
                remaining: 57,
            }
        );
    }

    #[test]
    fn duration_from_start_to_last_item() {
        assert_eq!(duration_weeks(date(2024, 1, 1), date(2024, 1, 22)), 4);
        assert_eq!(duration_weeks(date(2024, 1, 1), date(2024, 1, 1)), 1);
        assert_eq!(duration_weeks(date(2024, 1, 1), date(2024, 1, 7)), 1);
        assert_eq!(duration_weeks(date(2024, 1, 1), date(2024, 1, 8)), 2);
    }

    #[test]
    fn generated_duration_matches_last_item() {
        // 2 + 3 per week: 10 topics end on Wednesday 2024-01-10.
        let plan = generate(&topics(10), &mon_wed(), date(2024, 1, 1), &HashSet::new()).unwrap();
        assert_eq!(plan.last_date(), Some(date(2024, 1, 10)));
        assert_eq!(plan.duration_weeks, 2);
    }

    #[test]
    fn availability_deserializes_from_weekday_map() {
        let availability: WeeklyAvailability =
            serde_json::from_str(r#"{"Mon": 2, "Wed": 3}"#).unwrap();
        assert_eq!(availability, mon_wed());
        assert_eq!(availability.weekly_total(), 5);
        assert!(!availability.is_available(Weekday::Tue));
    }
}
