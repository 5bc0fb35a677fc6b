//! Audit persistence into the `audit_logs` table.

use async_trait::async_trait;
use axum_helpers::{AuditError, AuditEvent, AuditSink};
use sea_orm::{ConnectionTrait, DatabaseConnection, DbBackend, Statement};

const INSERT_AUDIT_LOG: &str = "INSERT INTO audit_logs \
     (id, module, operation, description, resource, ip_address, user_agent, occurred_at) \
     VALUES ($1, $2, $3, $4, $5, $6, $7, $8)";

/// Writes each audit event as one row of `audit_logs`.
#[derive(Clone)]
pub struct PostgresAuditSink {
    db: DatabaseConnection,
}

impl PostgresAuditSink {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn insert_statement(event: AuditEvent) -> Statement {
    Statement::from_sql_and_values(
        DbBackend::Postgres,
        INSERT_AUDIT_LOG,
        [
            event.id.into(),
            event.module.into(),
            event.operation.as_str().into(),
            event.description.into(),
            event.resource.into(),
            event.ip_address.into(),
            event.user_agent.into(),
            event.timestamp.into(),
        ],
    )
}

#[async_trait]
impl AuditSink for PostgresAuditSink {
    async fn record(&self, event: AuditEvent) -> Result<(), AuditError> {
        self.db
            .execute_raw(insert_statement(event))
            .await
            .map(|_| ())
            .map_err(|e| AuditError::Storage(e.to_string()))
    }
}
