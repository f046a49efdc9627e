pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use chrono::NaiveDate;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::db::Database;
use crate::services::date_utils::local_today;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Study day used for due classification and scheduling
    pub fn today(&self) -> NaiveDate {
        local_today(self.config.daily_reset_hour)
    }
}

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    tracing::info!("Connecting to database...");
    let db = Database::connect(&config.database_url, config.max_connections).await?;

    tracing::info!("Running migrations...");
    db.run_migrations().await?;

    let addr = config.addr();
    let state = AppState {
        db: Arc::new(db),
        config: Arc::new(config),
    };

    let app = build_router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()),
    );

    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// All routes; everything under `/api` except registration requires a token
pub fn build_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        // Settings
        .route(
            "/api/settings",
            get(routes::settings::get).put(routes::settings::update),
        )
        // Cards and review sessions
        .route("/api/cards", post(routes::cards::create))
        .route("/api/cards/due", get(routes::cards::due))
        .route("/api/sessions", post(routes::sessions::start))
        .route("/api/sessions/{id}", get(routes::sessions::get))
        .route("/api/sessions/{id}/rate", post(routes::sessions::rate))
        .route("/api/sessions/{id}/undo", post(routes::sessions::undo))
        // Rotation planning
        .route("/api/disciplines/{id}/topics", get(routes::topics::list))
        .route(
            "/api/schedules",
            get(routes::schedules::list).post(routes::schedules::generate),
        )
        .route("/api/schedules/{id}", get(routes::schedules::get))
        .route(
            "/api/schedule-items/{id}/date",
            put(routes::schedules::move_item),
        )
        .route(
            "/api/schedule-items/{id}/toggle",
            post(routes::schedules::toggle_item),
        )
        // Practice questions
        .route("/api/question-logs", post(routes::question_logs::create))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            routes::auth::auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/api/users/register", post(routes::users::register))
        .merge(protected_routes)
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
