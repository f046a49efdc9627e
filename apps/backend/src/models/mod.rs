//! Database models and API types

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

// Re-export shared types from study-core
pub use study_core::algorithm::fsrs::{DEFAULT_INITIAL_EASY_STABILITY, DEFAULT_RETENTION};
pub use study_core::{
    CardSnapshot, CardStatus, DueStatus, FsrsParams, ItemStatus, MemoryState, Quality,
    ReviewOutcome, ReviewSettings, SessionProgress, UndoSnapshot, WeeklyAvailability,
};

// === Database Entity Types ===

/// User resolved from a bearer token
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub token: String,
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
}

/// Scheduler settings in PostgreSQL
#[derive(Debug, Clone, FromRow)]
pub struct DbUserSettings {
    pub user_id: Uuid,
    pub fsrs_retention: f64,
    pub fsrs_params: Option<Json<FsrsParams>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DbUserSettings {
    /// Create default settings for a user
    pub fn default_for_user(user_id: Uuid) -> Self {
        Self {
            user_id,
            fsrs_retention: DEFAULT_RETENTION,
            fsrs_params: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    /// Convert to scheduler settings
    pub fn to_review_settings(&self) -> ReviewSettings {
        ReviewSettings {
            retention: self.fsrs_retention,
            params: self.fsrs_params.as_ref().map(|p| p.0.clone()),
        }
    }

    /// Convert to API settings
    pub fn to_api_settings(&self) -> SettingsResponse {
        let settings = self.to_review_settings();
        let params = settings.effective_params();
        SettingsResponse {
            fsrs_retention: settings.retention,
            initial_easy_stability: params.initial_easy_stability(),
            custom_params: settings.params.is_some(),
            fsrs_params: params,
        }
    }
}

/// Error-notebook card in PostgreSQL
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbCard {
    pub id: i64,
    pub user_id: Uuid,
    pub topic_id: Option<i64>,
    pub question_text: String,
    pub answer_text: String,
    pub notes: Option<String>,
    pub image_urls: Vec<String>,
    pub stability: Option<f64>,
    pub difficulty: Option<f64>,
    pub state: i16,
    pub lapses: i32,
    pub interval: i32,
    pub last_reviewed_at: Option<DateTime<Utc>>,
    pub next_review_date: Option<NaiveDate>,
    pub review_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DbCard {
    /// Scheduling fields as stored
    pub fn to_snapshot(&self) -> CardSnapshot {
        let lapses = self.lapses.max(0) as u32;
        CardSnapshot {
            stability: self.stability,
            difficulty: self.difficulty,
            status: CardStatus::from_code(self.state, lapses),
            lapses,
            interval: self.interval.max(0) as u32,
            last_reviewed_at: self.last_reviewed_at,
            next_review_date: self.next_review_date,
            review_count: self.review_count.max(0) as u32,
        }
    }

    /// Convert to API card, resolving legacy fields at read time
    pub fn to_api_card(&self, today: NaiveDate, now: DateTime<Utc>) -> ApiCard {
        let snapshot = self.to_snapshot();
        ApiCard {
            id: self.id,
            topic_id: self.topic_id,
            question_text: self.question_text.clone(),
            answer_text: self.answer_text.clone(),
            notes: self.notes.clone(),
            image_urls: self.image_urls.clone(),
            memory: MemoryState::from_card_fields(
                snapshot.stability,
                snapshot.difficulty,
                snapshot.status,
                snapshot.interval,
            ),
            legacy: MemoryState::is_legacy_seed(snapshot.stability, snapshot.interval),
            due_status: study_core::due::classify_card(snapshot.next_review_date, today),
            retrievability: study_core::review::current_retrievability(&snapshot, now),
            state: snapshot,
        }
    }
}

/// Review log entry
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbReviewEvent {
    pub id: Uuid,
    pub user_id: Uuid,
    pub flashcard_id: i64,
    pub session_id: Option<Uuid>,
    pub difficulty: String,
    pub xp_earned: i32,
    pub created_at: DateTime<Utc>,
}

/// Study session in PostgreSQL
#[derive(Debug, Clone, FromRow)]
pub struct DbStudySession {
    pub id: Uuid,
    pub user_id: Uuid,
    pub queue: Vec<i64>,
    pub position: i32,
    pub xp: i32,
    pub streak: i32,
    pub best_streak: i32,
    pub reviewed_count: i32,
    pub undo_snapshot: Option<Json<UndoSnapshot>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DbStudySession {
    /// Convert to study-core progress
    pub fn to_progress(&self) -> SessionProgress {
        SessionProgress {
            queue: self.queue.clone(),
            position: self.position.max(0) as usize,
            xp: self.xp.max(0) as u32,
            streak: self.streak.max(0) as u32,
            best_streak: self.best_streak.max(0) as u32,
            reviewed_count: self.reviewed_count.max(0) as u32,
        }
    }

    pub fn undo_snapshot(&self) -> Option<&UndoSnapshot> {
        self.undo_snapshot.as_ref().map(|s| &s.0)
    }

    pub fn to_api_session(&self) -> SessionResponse {
        let progress = self.to_progress();
        SessionResponse {
            id: self.id,
            current_card_id: progress.current_card(),
            remaining: progress.remaining(),
            can_undo: self.undo_snapshot.is_some(),
            progress,
        }
    }
}

/// Topic with its subdiscipline name
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Topic {
    pub id: i64,
    pub subdiscipline_id: i64,
    pub subdiscipline_name: String,
    pub name: String,
}

/// Rotation schedule
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbSchedule {
    pub id: Uuid,
    pub user_id: Uuid,
    pub rotation_discipline_id: i64,
    pub start_date: NaiveDate,
    pub duration_weeks: i32,
    pub created_at: DateTime<Utc>,
}

/// Rotation schedule item
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbScheduleItem {
    pub id: Uuid,
    pub schedule_id: Uuid,
    pub topic_id: i64,
    pub study_date: NaiveDate,
    pub status: String,
    pub version: i32,
    pub updated_at: DateTime<Utc>,
}

impl DbScheduleItem {
    pub fn item_status(&self) -> ItemStatus {
        ItemStatus::parse(&self.status).unwrap_or_default()
    }

    /// Convert to API item classified against `today`
    pub fn to_api_item(&self, today: NaiveDate) -> ApiScheduleItem {
        let status = self.item_status();
        ApiScheduleItem {
            id: self.id,
            topic_id: self.topic_id,
            study_date: self.study_date,
            status,
            version: self.version,
            due_status: study_core::classify(
                self.study_date,
                status == ItemStatus::Completed,
                today,
            ),
        }
    }
}

/// Practice question log entry
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbQuestionLog {
    pub id: Uuid,
    pub user_id: Uuid,
    pub topic_id: Option<i64>,
    pub questions_done: i32,
    pub correct_answers: i32,
    pub logged_on: NaiveDate,
    pub created_at: DateTime<Utc>,
}

// === API Request/Response Types ===

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub user_id: Uuid,
    pub token: String,
}

// Settings types
#[derive(Debug, Serialize, Deserialize)]
pub struct SettingsResponse {
    pub fsrs_retention: f64,
    pub initial_easy_stability: f64,
    pub custom_params: bool,
    pub fsrs_params: FsrsParams,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct UpdateSettingsRequest {
    pub fsrs_retention: Option<f64>,
    pub initial_easy_stability: Option<f64>,
    pub fsrs_params: Option<FsrsParams>,
    #[serde(default)]
    pub reset_params: bool,
}

// Card types
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateCardRequest {
    pub question_text: String,
    pub answer_text: String,
    pub notes: Option<String>,
    pub topic_id: Option<i64>,
    #[serde(default)]
    pub image_urls: Vec<String>,
    /// Pre-FSRS interval for imported cards
    pub interval: Option<i32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiCard {
    pub id: i64,
    pub topic_id: Option<i64>,
    pub question_text: String,
    pub answer_text: String,
    pub notes: Option<String>,
    pub image_urls: Vec<String>,
    #[serde(flatten)]
    pub state: CardSnapshot,
    pub memory: MemoryState,
    pub legacy: bool,
    pub due_status: DueStatus,
    pub retrievability: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DueCardsQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DueCardsResponse {
    pub today: NaiveDate,
    pub cards: Vec<ApiCard>,
}

// Session types
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct StartSessionRequest {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    pub id: Uuid,
    pub current_card_id: Option<i64>,
    pub remaining: usize,
    pub can_undo: bool,
    #[serde(flatten)]
    pub progress: SessionProgress,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RateCardRequest {
    pub card_id: i64,
    pub quality: Quality,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RateCardResponse {
    pub event_id: Uuid,
    pub xp_earned: u32,
    pub outcome: ReviewOutcome,
    pub card: ApiCard,
    pub session: SessionResponse,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UndoResponse {
    pub removed_event_id: Uuid,
    pub card: ApiCard,
    pub session: SessionResponse,
}

// Schedule types
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateScheduleRequest {
    pub discipline_id: i64,
    pub availability: WeeklyAvailability,
    pub start_date: NaiveDate,
    /// Schedule whose completed items carry over
    pub regenerate_from: Option<Uuid>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ScheduleListQuery {
    pub discipline_id: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiScheduleItem {
    pub id: Uuid,
    pub topic_id: i64,
    pub study_date: NaiveDate,
    pub status: ItemStatus,
    pub version: i32,
    pub due_status: DueStatus,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ScheduleResponse {
    pub schedule: DbSchedule,
    pub items: Vec<ApiScheduleItem>,
    pub completed_count: usize,
    pub overdue_count: usize,
}

impl ScheduleResponse {
    pub fn new(schedule: DbSchedule, items: &[DbScheduleItem], today: NaiveDate) -> Self {
        let items: Vec<ApiScheduleItem> = items.iter().map(|i| i.to_api_item(today)).collect();
        let count = |status: DueStatus| items.iter().filter(|i| i.due_status == status).count();
        Self {
            completed_count: count(DueStatus::Completed),
            overdue_count: count(DueStatus::Overdue),
            schedule,
            items,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ScheduleListResponse {
    pub schedules: Vec<DbSchedule>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MoveItemRequest {
    pub study_date: NaiveDate,
    pub expected_version: Option<i32>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ToggleItemRequest {
    pub expected_version: Option<i32>,
}

// Question log types
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateQuestionLogRequest {
    pub topic_id: Option<i64>,
    pub questions_done: i32,
    pub correct_answers: i32,
    pub logged_on: Option<NaiveDate>,
}

impl CreateQuestionLogRequest {
    /// Reject impossible counts before anything is written
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.questions_done < 0 || self.correct_answers < 0 {
            return Err("question counts must not be negative".to_string());
        }
        if self.correct_answers > self.questions_done {
            return Err(format!(
                "correct answers ({}) exceed questions done ({})",
                self.correct_answers, self.questions_done
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn card(stability: Option<f64>, interval: i32, state: i16, lapses: i32) -> DbCard {
        DbCard {
            id: 1,
            user_id: Uuid::nil(),
            topic_id: None,
            question_text: "Q".to_string(),
            answer_text: "A".to_string(),
            notes: None,
            image_urls: vec![],
            stability,
            difficulty: stability.map(|_| 6.0),
            state,
            lapses,
            interval,
            last_reviewed_at: None,
            next_review_date: None,
            review_count: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn legacy_card_is_migrated_on_read_only() {
        let db_card = card(None, 10, 0, 0);
        let api = db_card.to_api_card(Utc::now().date_naive(), Utc::now());

        assert!(api.legacy);
        assert_eq!(api.memory.stability, 10.0);
        assert_eq!(api.memory.difficulty, 5.0);
        assert_eq!(api.memory.status, CardStatus::Review);
        // Stored fields stay as they were.
        assert_eq!(api.state.stability, None);
        assert_eq!(db_card.stability, None);
    }

    #[test]
    fn state_code_one_with_lapses_reads_as_relearning() {
        let snapshot = card(Some(2.0), 0, 1, 1).to_snapshot();
        assert_eq!(snapshot.status, CardStatus::Relearning);
    }

    #[test]
    fn unscheduled_card_is_due_today() {
        let api = card(None, 0, 0, 0).to_api_card(Utc::now().date_naive(), Utc::now());
        assert_eq!(api.due_status, DueStatus::DueToday);
        assert_eq!(api.retrievability, None);
    }

    #[test]
    fn default_settings_expose_easy_seed() {
        let settings = DbUserSettings::default_for_user(Uuid::nil()).to_api_settings();
        assert_eq!(settings.fsrs_retention, 0.9);
        assert_eq!(settings.initial_easy_stability, DEFAULT_INITIAL_EASY_STABILITY);
        assert!(!settings.custom_params);
    }

    #[test]
    fn question_log_validation() {
        let request = |done, correct| CreateQuestionLogRequest {
            topic_id: None,
            questions_done: done,
            correct_answers: correct,
            logged_on: None,
        };
        assert!(request(10, 7).validate().is_ok());
        assert!(request(10, 10).validate().is_ok());
        assert!(request(5, 6).validate().is_err());
        assert!(request(-1, 0).validate().is_err());
    }

    #[test]
    fn schedule_response_counts_statuses() {
        let today = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        let item = |day: u32, status: &str| DbScheduleItem {
            id: Uuid::new_v4(),
            schedule_id: Uuid::nil(),
            topic_id: day as i64,
            study_date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            status: status.to_string(),
            version: 0,
            updated_at: Utc::now(),
        };
        let schedule = DbSchedule {
            id: Uuid::nil(),
            user_id: Uuid::nil(),
            rotation_discipline_id: 1,
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            duration_weeks: 3,
            created_at: Utc::now(),
        };
        let response = ScheduleResponse::new(
            schedule,
            &[
                item(1, "completed"),
                item(3, "pending"),
                item(10, "pending"),
                item(17, "pending"),
            ],
            today,
        );
        assert_eq!(response.completed_count, 1);
        assert_eq!(response.overdue_count, 1);
        assert_eq!(response.items[2].due_status, DueStatus::DueToday);
        assert_eq!(response.items[3].due_status, DueStatus::Upcoming);
    }
}
