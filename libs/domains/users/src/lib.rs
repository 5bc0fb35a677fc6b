//! Users Domain
//!
//! REST management of user accounts: detail lookup, filtered and paged
//! listing, creation, username existence checks, update and delete.
//! Every response uses the `{code, message, data}` envelope and every
//! successful call leaves one audit event.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  ← HTTP endpoints, envelope, audit scope
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Service   │  ← Business logic, password hashing, uniqueness
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │ Repository  │  ← Data access (trait + in-memory / PostgreSQL)
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Models    │  ← Entities, DTOs, filters
//! └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use axum_helpers::TracingAuditSink;
//! use domain_users::{handlers, InMemoryUserRepository, UserService};
//!
//! let service = UserService::new(InMemoryUserRepository::new());
//! let router = handlers::router(service, Arc::new(TracingAuditSink));
//! ```

pub mod error;
pub mod handlers;
pub mod models;
mod postgres_repository_impl;
pub mod repository;
pub mod service;

// Re-export commonly used types
pub use error::{UserError, UserResult};
pub use handlers::{ApiDoc, UsersState};
pub use models::{
    CreateUser, SortField, SortOrder, UpdateUser, User, UserCheck, UserFilter, UserId,
    UserResponse,
};
pub use postgres_repository_impl::PostgresUserRepository;
pub use repository::{InMemoryUserRepository, UserRepository};
pub use service::{UserManagement, UserService};
