//! Business logic layered over the database

pub mod date_utils;
pub mod review_pipeline;
pub mod rotation;
