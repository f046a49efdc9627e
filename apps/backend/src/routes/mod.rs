//! HTTP route handlers

pub mod auth;
pub mod cards;
pub mod question_logs;
pub mod schedules;
pub mod sessions;
pub mod settings;
pub mod topics;
pub mod users;
