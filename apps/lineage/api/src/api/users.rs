use std::sync::Arc;

use axum::Router;
use axum_helpers::{AuditSink, CompositeAuditSink, TracingAuditSink};
use domain_users::{InMemoryUserRepository, PostgresUserRepository, UserService, handlers};
use tracing::info;

use crate::audit::PostgresAuditSink;
use crate::state::AppState;

/// Audit events always reach the tracing target; with a database they are
/// also stored in `audit_logs`.
pub fn audit_sink(state: &AppState) -> Arc<dyn AuditSink> {
    match &state.db {
        Some(db) => Arc::new(CompositeAuditSink::new(vec![
            Arc::new(TracingAuditSink),
            Arc::new(PostgresAuditSink::new(db.clone())),
        ])),
        None => Arc::new(TracingAuditSink),
    }
}

pub fn router(state: &AppState) -> Router {
    let audit = audit_sink(state);

    match &state.db {
        Some(db) => {
            info!("Users backed by PostgreSQL");
            let service = UserService::new(PostgresUserRepository::new(db.clone()));
            handlers::router(service, audit)
        }
        None => {
            info!("Users backed by in-memory storage");
            let service = UserService::new(InMemoryUserRepository::new());
            handlers::router(service, audit)
        }
    }
}
