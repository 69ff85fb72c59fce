//! Folio portfolio server
//!
//! REST JSON API behind a portfolio website: daily posts, case studies and
//! contact inquiries, with an admin PIN gate, an in-process rate limiter and
//! an in-memory fallback when the primary datastore is unreachable.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;
pub mod validation;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}
