//! # Axum Helpers
//!
//! Shared building blocks for the HTTP services in this workspace.
//!
//! ## Modules
//!
//! - **[`envelope`]**: Uniform `{code, message, data}` response envelope
//! - **[`errors`]**: Error envelope with type-safe error codes
//! - **[`extractors`]**: Validated JSON/query and integer path extractors
//! - **[`audit`]**: Audit events, sinks, and the per-request audit scope
//! - **[`pagination`]**: Page metadata for list endpoints
//! - **[`http`]**: HTTP middleware (CORS, security headers)
//! - **[`server`]**: Server setup, health checks, graceful shutdown
//!
//! ## Quick Start
//!
//! ```ignore
//! use axum::Router;
//! use axum_helpers::server::{create_production_app, create_router};
//! use core_config::server::ServerConfig;
//! use utoipa::OpenApi;
//!
//! #[derive(OpenApi)]
//! #[openapi(paths())]
//! struct ApiDoc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfig::default();
//!     let router = create_router::<ApiDoc>(Router::new(), &config)?;
//!     create_production_app(router, &config, async {}).await?;
//!     Ok(())
//! }
//! ```

pub mod audit;
pub mod envelope;
pub mod errors;
pub mod extractors;
pub mod http;
pub mod pagination;
pub mod server;

// Re-export server types
pub use server::{
    HealthCheckFuture, HealthResponse, ShutdownCoordinator, create_app, create_production_app,
    create_router, health_router, run_health_checks, shutdown_signal,
};

// Re-export HTTP middleware
pub use http::{create_cors_layer, security_headers};

// Re-export envelope and error types
pub use envelope::{ApiMessage, ApiResponse, ResultMessage};
pub use errors::{AppError, ErrorCode, ErrorResponse};
pub use pagination::PageInfo;

// Re-export extractors
pub use extractors::{IdPath, ValidatedJson, ValidatedQuery};

// Re-export audit types
pub use audit::{
    AuditError, AuditEvent, AuditScope, AuditSink, CompositeAuditSink, MemoryAuditSink,
    OperationType, TracingAuditSink, extract_ip_from_headers, extract_user_agent,
};
