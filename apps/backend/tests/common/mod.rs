//! Common test utilities and fixtures for integration tests.
//!
//! This module provides shared test infrastructure including:
//! - TestContext for setting up test environment with database
//! - Helpers for seeding reference data
//! - Authentication helpers
//!
//! # Requirements
//! Integration tests require a PostgreSQL database (set DATABASE_URL env var).

#![allow(dead_code)]

pub mod fixtures;

use std::sync::Arc;

use axum::Router;
use axum_test::TestServer;
use uuid::Uuid;

use residency_backend::config::Config;
use residency_backend::db::Database;
use residency_backend::{build_router, AppState};

/// Test context containing database connection and router.
///
/// Requires DATABASE_URL environment variable to be set.
pub struct TestContext {
    pub db: Arc<Database>,
    app: Router,
}

impl TestContext {
    /// Create a new test context.
    ///
    /// # Panics
    /// Panics if DATABASE_URL is not set or database connection fails.
    pub async fn new() -> Self {
        dotenvy::dotenv().ok();

        let config = Config::from_env().expect("DATABASE_URL must be set for integration tests");

        let db = Database::connect(&config.database_url, 2)
            .await
            .expect("Failed to connect to test database");

        db.run_migrations()
            .await
            .expect("Failed to run migrations");

        let db = Arc::new(db);
        let state = AppState {
            db: db.clone(),
            config: Arc::new(Config {
                daily_reset_hour: 0,
                ..config
            }),
        };

        Self {
            db,
            app: build_router(state),
        }
    }

    /// Get the router for use with axum-test.
    pub fn router(&self) -> Router {
        self.app.clone()
    }

    pub fn server(&self) -> TestServer {
        TestServer::new(self.router()).unwrap()
    }

    /// Create a test user and return its ID and token.
    pub async fn create_test_user(&self) -> (Uuid, String) {
        let user = self
            .db
            .create_user(Some("test resident"))
            .await
            .expect("Failed to create test user");
        (user.id, user.token)
    }

    /// Format authorization header value.
    pub fn auth_header_value(token: &str) -> String {
        format!("Bearer {}", token)
    }

    /// Insert a discipline with one topic per `(subdiscipline, topic)` pair.
    ///
    /// Returns the discipline id and topic ids in planning order.
    pub async fn create_discipline(&self, topics: &[(&str, &str)]) -> (i64, Vec<i64>) {
        let discipline_id: i64 =
            sqlx::query_scalar("INSERT INTO disciplines (name) VALUES ($1) RETURNING id")
                .bind(format!("Discipline {}", Uuid::new_v4()))
                .fetch_one(self.db.pool())
                .await
                .expect("Failed to insert discipline");

        for (subdiscipline, topic) in topics {
            let subdiscipline_id: i64 = match sqlx::query_scalar::<_, i64>(
                "SELECT id FROM subdisciplines WHERE discipline_id = $1 AND name = $2",
            )
            .bind(discipline_id)
            .bind(subdiscipline)
            .fetch_optional(self.db.pool())
            .await
            .expect("Failed to query subdiscipline")
            {
                Some(id) => id,
                None => sqlx::query_scalar::<_, i64>(
                    "INSERT INTO subdisciplines (discipline_id, name) VALUES ($1, $2) RETURNING id",
                )
                .bind(discipline_id)
                .bind(subdiscipline)
                .fetch_one(self.db.pool())
                .await
                .expect("Failed to insert subdiscipline"),
            };

            sqlx::query("INSERT INTO topics (subdiscipline_id, name) VALUES ($1, $2)")
                .bind(subdiscipline_id)
                .bind(topic)
                .execute(self.db.pool())
                .await
                .expect("Failed to insert topic");
        }

        let topic_ids = self
            .db
            .get_discipline_topics(discipline_id)
            .await
            .expect("Failed to read topics")
            .into_iter()
            .map(|t| t.id)
            .collect();

        (discipline_id, topic_ids)
    }

    /// Clean up test data for a user.
    ///
    /// Sessions, cards, reviews, schedules and logs cascade from the user row.
    pub async fn cleanup_user(&self, user_id: Uuid) {
        let _ = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(self.db.pool())
            .await;
    }

    /// Remove a discipline and its topics. Call after `cleanup_user`.
    pub async fn cleanup_discipline(&self, discipline_id: i64) {
        let _ = sqlx::query("DELETE FROM disciplines WHERE id = $1")
            .bind(discipline_id)
            .execute(self.db.pool())
            .await;
    }
}
