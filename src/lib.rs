//! Stockscan Server
//!
//! Warehouse scan station backend: barcode scan sessions that look items up
//! in the remote stock API and capture stock-take counts, plus the sales and
//! dispatch order status workflow.

use std::sync::Arc;

pub mod api;
pub mod clients;
pub mod config;
pub mod error;
pub mod models;
pub mod scanner;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}
