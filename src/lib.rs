//! Local library catalog server
//!
//! Authors, books, genres and book copies behind a REST JSON API, with
//! referential-integrity checks on delete and joined read views.

use std::{sync::Arc, time::Duration};

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}

impl AppState {
    pub fn new(config: AppConfig, services: services::Services) -> Self {
        Self {
            config: Arc::new(config),
            services: Arc::new(services),
        }
    }

    /// Deadline for every store query issued while serving one request
    pub fn query_context(&self) -> repository::QueryContext {
        repository::QueryContext::new(Duration::from_millis(self.config.store.query_timeout_ms))
    }
}
