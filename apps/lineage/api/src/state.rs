//! Application state management.
//!
//! This module defines the shared application state passed to all request handlers.

use database::postgres::DatabaseConnection;

/// Shared application state.
///
/// Cloned into routers that need it; the connection pool is reference counted.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration loaded from environment variables
    pub config: crate::config::Config,
    /// PostgreSQL connection pool, absent when running on in-memory storage
    pub db: Option<DatabaseConnection>,
}
