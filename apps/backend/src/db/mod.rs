//! PostgreSQL database operations

mod cards;
mod schedules;

use sqlx::{postgres::PgPoolOptions, types::Json, PgPool};
use uuid::Uuid;

use crate::error::Result;
use crate::models::*;

pub use schedules::NewSchedule;

/// Database wrapper with connection pool
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect to PostgreSQL and create connection pool
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        Ok(Self::new(pool))
    }

    /// Run database migrations
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Get the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    // === User Repository ===

    /// Create a new user with generated token and default settings
    pub async fn create_user(&self, name: Option<&str>) -> Result<User> {
        let token = Uuid::new_v4().to_string();
        let mut tx = self.pool.begin().await?;

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (token, name)
            VALUES ($1, $2)
            RETURNING id, token, name, created_at, last_seen_at
            "#,
        )
        .bind(&token)
        .bind(name)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO user_settings (user_id)
            VALUES ($1)
            "#,
        )
        .bind(user.id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(user)
    }

    /// Get user by token
    pub async fn get_user_by_token(&self, token: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, token, name, created_at, last_seen_at
            FROM users
            WHERE token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Update user last_seen_at timestamp
    pub async fn update_last_seen(&self, user_id: Uuid) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET last_seen_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // === Settings Repository ===

    /// Get scheduler settings, defaults if the row is missing
    pub async fn get_settings(&self, user_id: Uuid) -> Result<DbUserSettings> {
        let settings = sqlx::query_as::<_, DbUserSettings>(
            r#"
            SELECT user_id, fsrs_retention, fsrs_params, created_at, updated_at
            FROM user_settings
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(settings.unwrap_or_else(|| DbUserSettings::default_for_user(user_id)))
    }

    /// Insert or update scheduler settings
    pub async fn upsert_settings(
        &self,
        user_id: Uuid,
        retention: f64,
        params: Option<&FsrsParams>,
    ) -> Result<DbUserSettings> {
        let settings = sqlx::query_as::<_, DbUserSettings>(
            r#"
            INSERT INTO user_settings (user_id, fsrs_retention, fsrs_params)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id) DO UPDATE SET
                fsrs_retention = EXCLUDED.fsrs_retention,
                fsrs_params = EXCLUDED.fsrs_params,
                updated_at = NOW()
            RETURNING user_id, fsrs_retention, fsrs_params, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(retention)
        .bind(params.map(Json))
        .fetch_one(&self.pool)
        .await?;

        Ok(settings)
    }

    // === Reference Data ===

    /// Topic pool of a discipline in planning order
    pub async fn get_discipline_topics(&self, discipline_id: i64) -> Result<Vec<Topic>> {
        let topics = sqlx::query_as::<_, Topic>(
            r#"
            SELECT t.id, t.subdiscipline_id, s.name AS subdiscipline_name, t.name
            FROM topics t
            JOIN subdisciplines s ON s.id = t.subdiscipline_id
            WHERE s.discipline_id = $1
            ORDER BY s.name, t.name, t.id
            "#,
        )
        .bind(discipline_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(topics)
    }

    pub async fn discipline_exists(&self, discipline_id: i64) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM disciplines WHERE id = $1)")
                .bind(discipline_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    // === Question Logs ===

    pub async fn insert_question_log(
        &self,
        user_id: Uuid,
        request: &CreateQuestionLogRequest,
        logged_on: chrono::NaiveDate,
    ) -> Result<DbQuestionLog> {
        let log = sqlx::query_as::<_, DbQuestionLog>(
            r#"
            INSERT INTO question_logs
                (user_id, topic_id, questions_done, correct_answers, logged_on)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, topic_id, questions_done, correct_answers, logged_on, created_at
            "#,
        )
        .bind(user_id)
        .bind(request.topic_id)
        .bind(request.questions_done)
        .bind(request.correct_answers)
        .bind(logged_on)
        .fetch_one(&self.pool)
        .await?;

        Ok(log)
    }
}
