//! Library Catalog Server
//!
//! REST JSON API for a library catalog: genres, languages, authors, books
//! and their physical copies, plus user administration and background jobs.
//! Every catalog write passes through the rule engine in [`validation`].

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
