//! Readiness check with a real database ping.

use crate::state::AppState;
use axum::{extract::State, response::Response};
use axum_helpers::server::{HealthCheckFuture, run_health_checks};

/// Readiness check endpoint.
///
/// Pings PostgreSQL when one is configured; in-memory deployments are
/// always ready.
pub async fn ready_handler(State(state): State<AppState>) -> Response {
    let mut checks: Vec<(&str, HealthCheckFuture<'_>)> = Vec::new();

    if let Some(db) = &state.db {
        let ping: HealthCheckFuture<'_> = Box::pin(async move {
            database::postgres::check_health(db)
                .await
                .map_err(|e| format!("Database ping failed: {}", e))
        });
        checks.push(("database", ping));
    }

    run_health_checks(checks).await
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::{Config, Environment};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use core_config::{app_info, server::ServerConfig};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    pub(crate) fn in_memory_state() -> AppState {
        AppState {
            config: Config {
                app: app_info!(),
                server: ServerConfig::default(),
                environment: Environment::Development,
                database: None,
                run_migrations: false,
            },
            db: None,
        }
    }

    #[tokio::test]
    async fn test_ready_without_database() {
        let app = crate::api::ready_router(in_memory_state());

        let response = app
            .oneshot(Request::builder().uri("/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["status"], "ready");
    }
}
