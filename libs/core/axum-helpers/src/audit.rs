//! Audit trail for API operations.
//!
//! Handlers wrap their primary action in an [`AuditScope`]; the scope hands
//! one [`AuditEvent`] to the configured [`AuditSink`] once the action has
//! succeeded. Failed actions leave no record.
//!
//! # Example
//! ```ignore
//! use axum_helpers::audit::{AuditScope, OperationType};
//!
//! let user = AuditScope::new(state.audit.clone(), "USERS", OperationType::Query)
//!     .with_request(&headers)
//!     .with_resource(format!("user:{}", id))
//!     .run(service.query_user(id), |user| format!("Query User: {}", user.username))
//!     .await?;
//! ```

use async_trait::async_trait;
use axum::http::HeaderMap;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use utoipa::ToSchema;
use uuid::Uuid;

/// Kind of operation an audit record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationType {
    Query,
    Create,
    Update,
    Delete,
}

impl OperationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Query => "QUERY",
            Self::Create => "CREATE",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for OperationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One audited API call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Time-ordered identifier (UUIDv7)
    pub id: Uuid,
    /// Owning module, e.g. "USERS"
    pub module: String,
    pub operation: OperationType,
    /// Human-readable summary, e.g. "Query User: alice"
    pub description: String,
    /// Resource affected (e.g., "user:42")
    pub resource: Option<String>,
    /// Client IP address
    pub ip_address: Option<String>,
    /// User agent string
    pub user_agent: Option<String>,
    /// Timestamp when the event occurred
    pub timestamp: DateTime<Utc>,
}

impl AuditEvent {
    pub fn new(
        module: impl Into<String>,
        operation: OperationType,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            module: module.into(),
            operation,
            description: description.into(),
            resource: None,
            ip_address: None,
            user_agent: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_resource(mut self, resource: Option<String>) -> Self {
        self.resource = resource;
        self
    }

    /// Add IP address to the audit event.
    pub fn with_ip(mut self, ip: Option<String>) -> Self {
        self.ip_address = ip;
        self
    }

    /// Add user agent to the audit event.
    pub fn with_user_agent(mut self, user_agent: Option<String>) -> Self {
        self.user_agent = user_agent;
        self
    }

    /// Emit the event on the `audit` tracing target.
    ///
    /// Configure your logging backend to route audit logs to a separate file/system.
    pub fn log(&self) {
        tracing::info!(
            target: "audit",
            audit_id = %self.id,
            module = %self.module,
            operation = %self.operation,
            resource = self.resource.as_deref(),
            ip = self.ip_address.as_deref(),
            user_agent = self.user_agent.as_deref(),
            timestamp = %self.timestamp,
            "{}",
            self.description
        );
    }
}

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("Audit storage error: {0}")]
    Storage(String),
}

/// Destination for audit events.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, event: AuditEvent) -> Result<(), AuditError>;
}

/// Writes events to the `audit` tracing target only.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditSink;

#[async_trait]
impl AuditSink for TracingAuditSink {
    async fn record(&self, event: AuditEvent) -> Result<(), AuditError> {
        event.log();
        Ok(())
    }
}

/// Keeps events in memory. Intended for tests and local development.
#[derive(Debug, Clone, Default)]
pub struct MemoryAuditSink {
    events: Arc<RwLock<Vec<AuditEvent>>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the recorded events in insertion order.
    pub async fn events(&self) -> Vec<AuditEvent> {
        self.events.read().await.clone()
    }

    pub async fn descriptions(&self) -> Vec<String> {
        self.events
            .read()
            .await
            .iter()
            .map(|e| e.description.clone())
            .collect()
    }
}

#[async_trait]
impl AuditSink for MemoryAuditSink {
    async fn record(&self, event: AuditEvent) -> Result<(), AuditError> {
        self.events.write().await.push(event);
        Ok(())
    }
}

/// Forwards every event to each inner sink, in order.
///
/// Every sink is attempted; the first failure is returned.
#[derive(Clone, Default)]
pub struct CompositeAuditSink {
    sinks: Vec<Arc<dyn AuditSink>>,
}

impl CompositeAuditSink {
    pub fn new(sinks: Vec<Arc<dyn AuditSink>>) -> Self {
        Self { sinks }
    }
}

#[async_trait]
impl AuditSink for CompositeAuditSink {
    async fn record(&self, event: AuditEvent) -> Result<(), AuditError> {
        let mut first_error = None;

        for sink in &self.sinks {
            if let Err(e) = sink.record(event.clone()).await {
                first_error.get_or_insert(e);
            }
        }

        first_error.map_or(Ok(()), Err)
    }
}

/// Audit context for one request.
///
/// Collects request metadata up front and records the event only when
/// [`AuditScope::run`] sees the action succeed, or when
/// [`AuditScope::record`] is called explicitly.
pub struct AuditScope {
    sink: Arc<dyn AuditSink>,
    module: &'static str,
    operation: OperationType,
    resource: Option<String>,
    ip_address: Option<String>,
    user_agent: Option<String>,
}

impl AuditScope {
    pub fn new(sink: Arc<dyn AuditSink>, module: &'static str, operation: OperationType) -> Self {
        Self {
            sink,
            module,
            operation,
            resource: None,
            ip_address: None,
            user_agent: None,
        }
    }

    /// Capture client IP and user agent from the request headers.
    pub fn with_request(mut self, headers: &HeaderMap) -> Self {
        self.ip_address = extract_ip_from_headers(headers);
        self.user_agent = extract_user_agent(headers);
        self
    }

    pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = Some(resource.into());
        self
    }

    /// Await `action`; on success describe its output and record the event.
    ///
    /// Errors are returned untouched and nothing is recorded.
    pub async fn run<T, E, Fut, D>(self, action: Fut, describe: D) -> Result<T, E>
    where
        Fut: Future<Output = Result<T, E>>,
        D: FnOnce(&T) -> String,
    {
        let value = action.await?;
        let description = describe(&value);
        self.record(description).await;
        Ok(value)
    }

    /// Record the event now. Sink failures are logged, never propagated.
    pub async fn record(self, description: impl Into<String>) {
        let event = AuditEvent::new(self.module, self.operation, description)
            .with_resource(self.resource)
            .with_ip(self.ip_address)
            .with_user_agent(self.user_agent);

        let audit_id = event.id;
        if let Err(e) = self.sink.record(event).await {
            tracing::warn!(%audit_id, "Failed to record audit event: {}", e);
        }
    }
}

/// Extract client IP address from HTTP headers.
///
/// Returns the first IP from X-Forwarded-For or X-Real-IP as fallback.
pub fn extract_ip_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|v| v.to_str().ok())
                .map(|s| s.trim().to_string())
        })
}

/// Extract user agent string from HTTP headers.
pub fn extract_user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    struct FailingSink;

    #[async_trait]
    impl AuditSink for FailingSink {
        async fn record(&self, _event: AuditEvent) -> Result<(), AuditError> {
            Err(AuditError::Storage("disk full".to_string()))
        }
    }

    fn headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("10.0.0.1, 10.0.0.2"));
        headers.insert("user-agent", HeaderValue::from_static("curl/8.5"));
        headers
    }

    #[test]
    fn test_extract_ip_prefers_forwarded_for() {
        assert_eq!(extract_ip_from_headers(&headers()).as_deref(), Some("10.0.0.1"));

        let mut real_ip_only = HeaderMap::new();
        real_ip_only.insert("x-real-ip", HeaderValue::from_static("192.168.1.9"));
        assert_eq!(
            extract_ip_from_headers(&real_ip_only).as_deref(),
            Some("192.168.1.9")
        );

        assert_eq!(extract_ip_from_headers(&HeaderMap::new()), None);
    }

    #[test]
    fn test_operation_type_serialization() {
        assert_eq!(
            serde_json::to_string(&OperationType::Delete).unwrap(),
            "\"DELETE\""
        );
        assert_eq!(OperationType::Query.to_string(), "QUERY");
    }

    #[test]
    fn test_event_ids_are_unique() {
        let a = AuditEvent::new("USERS", OperationType::Query, "Query Users");
        let b = AuditEvent::new("USERS", OperationType::Query, "Query Users");
        assert_ne!(a.id, b.id);
    }

    #[tokio::test]
    async fn test_run_records_after_success() {
        let sink = MemoryAuditSink::new();
        let scope = AuditScope::new(Arc::new(sink.clone()), "USERS", OperationType::Query)
            .with_request(&headers())
            .with_resource("user:7");

        let result: Result<&str, String> = scope
            .run(async { Ok("alice") }, |name| format!("Query User: {}", name))
            .await;
        assert_eq!(result.unwrap(), "alice");

        let events = sink.events().await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].module, "USERS");
        assert_eq!(events[0].operation, OperationType::Query);
        assert_eq!(events[0].description, "Query User: alice");
        assert_eq!(events[0].resource.as_deref(), Some("user:7"));
        assert_eq!(events[0].ip_address.as_deref(), Some("10.0.0.1"));
        assert_eq!(events[0].user_agent.as_deref(), Some("curl/8.5"));
    }

    #[tokio::test]
    async fn test_run_skips_record_on_failure() {
        let sink = MemoryAuditSink::new();
        let scope = AuditScope::new(Arc::new(sink.clone()), "USERS", OperationType::Delete);

        let result: Result<(), String> = scope
            .run(async { Err("not found".to_string()) }, |_| {
                "Delete User: ghost".to_string()
            })
            .await;

        assert_eq!(result.unwrap_err(), "not found");
        assert!(sink.events().await.is_empty());
    }

    #[tokio::test]
    async fn test_sink_failure_does_not_fail_action() {
        let scope = AuditScope::new(Arc::new(FailingSink), "USERS", OperationType::Create);
        let result: Result<i64, String> = scope.run(async { Ok(1) }, |_| "x".to_string()).await;
        assert_eq!(result.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_composite_reaches_every_sink() {
        let first = MemoryAuditSink::new();
        let second = MemoryAuditSink::new();
        let composite = CompositeAuditSink::new(vec![
            Arc::new(FailingSink),
            Arc::new(first.clone()),
            Arc::new(second.clone()),
        ]);

        let result = composite
            .record(AuditEvent::new("USERS", OperationType::Update, "Update User: bob"))
            .await;

        assert!(matches!(result, Err(AuditError::Storage(_))));
        assert_eq!(first.descriptions().await, vec!["Update User: bob"]);
        assert_eq!(second.descriptions().await.len(), 1);
    }
}
