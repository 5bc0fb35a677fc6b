use super::shutdown::{ShutdownCoordinator, shutdown_signal};
use crate::errors::handlers::{method_not_allowed, not_found};
use crate::http::{cors::create_cors_layer, security::security_headers};
use axum::{Router, middleware};
use core_config::server::ServerConfig;
use std::io;
use tower_http::compression::CompressionLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{Level, info};
use utoipa::OpenApi;

/// Starts the Axum server with graceful shutdown.
///
/// # Errors
/// Returns an error if:
/// - The TCP listener fails to bind to the configured address
/// - The server encounters an error during operation
pub async fn create_app(router: Router, server_config: &ServerConfig) -> io::Result<()> {
    let listener = tokio::net::TcpListener::bind(server_config.address()).await?;

    info!("Server starting on {}", listener.local_addr()?);
    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .inspect_err(|e| {
            tracing::error!("Server encountered an error: {:?}", e);
        })?;

    Ok(())
}

/// Combines API routes with documentation and cross-cutting middleware.
///
/// This function sets up:
/// - OpenAPI documentation (Swagger UI, ReDoc, RapiDoc, Scalar)
/// - API routes nested under `base_path`, or at the root when it is unset
/// - Tracing, security headers, compression, and CORS when origins are configured
/// - Envelope-shaped 404 and 405 fallbacks
///
/// Health endpoints are added by the app.
///
/// # Errors
/// Returns `InvalidInput` when a configured CORS origin is not a valid header value.
///
/// # Example
/// ```ignore
/// use axum::Router;
/// use utoipa::OpenApi;
/// use axum_helpers::server::create_router;
///
/// #[derive(OpenApi)]
/// #[openapi(paths(/* your paths */))]
/// struct ApiDoc;
///
/// let api_routes = Router::new().nest("/users", users_router);
/// let router = create_router::<ApiDoc>(api_routes, &config)?;
/// ```
pub fn create_router<T>(apis: Router, server_config: &ServerConfig) -> io::Result<Router>
where
    T: OpenApi + 'static,
{
    use utoipa_rapidoc::RapiDoc;
    use utoipa_redoc::{Redoc, Servable as RedocServable};
    use utoipa_scalar::{Scalar, Servable as ScalarServable};
    use utoipa_swagger_ui::SwaggerUi;

    let doc = openapi_document::<T>(server_config.base_path.as_deref());
    let docs = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", doc.clone()))
        .merge(Redoc::with_url("/redoc", doc.clone()))
        .merge(RapiDoc::new("/api-docs/openapi.json").path("/rapidoc"))
        .merge(Scalar::with_url("/scalar", doc));

    let router = match server_config.base_path.as_deref() {
        Some(base_path) => {
            info!("Mounting API routes under {}", base_path);
            docs.nest(base_path, apis)
        }
        None => docs.merge(apis),
    };

    let router = router
        .fallback(not_found)
        .method_not_allowed_fallback(method_not_allowed)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(middleware::from_fn(security_headers))
        // gzip, br, deflate, zstd based on Accept-Encoding
        .layer(CompressionLayer::new());

    if server_config.cors_allowed_origins.is_empty() {
        return Ok(router);
    }

    info!(
        "CORS configured with allowed origins: {}",
        server_config.cors_allowed_origins.join(",")
    );
    Ok(router.layer(create_cors_layer(&server_config.cors_allowed_origins)?))
}

/// OpenAPI document for `T` with every path prefixed by `base_path`.
fn openapi_document<T: OpenApi>(base_path: Option<&str>) -> utoipa::openapi::OpenApi {
    let mut doc = T::openapi();
    if let Some(base_path) = base_path {
        let base_path = base_path.trim_end_matches('/');
        doc.paths.paths = std::mem::take(&mut doc.paths.paths)
            .into_iter()
            .map(|(path, item)| (format!("{}{}", base_path, path), item))
            .collect();
    }
    doc
}

/// Serves `router` until a shutdown signal, then runs `cleanup` bounded by
/// `server_config.shutdown_timeout`.
///
/// # Example
/// ```ignore
/// use axum_helpers::server::create_production_app;
///
/// let cleanup = async move {
///     db.close().await.ok();
/// };
///
/// create_production_app(router, &config, cleanup).await?;
/// ```
pub async fn create_production_app<F>(
    router: Router,
    server_config: &ServerConfig,
    cleanup: F,
) -> io::Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let shutdown_timeout = server_config.shutdown_timeout;
    let (coordinator, mut shutdown_rx) = ShutdownCoordinator::new();
    let signal_handle = coordinator.clone();

    let listener = tokio::net::TcpListener::bind(server_config.address()).await?;
    info!("Server starting on {}", listener.local_addr()?);

    let cleanup_handle = tokio::spawn(async move {
        let _ = shutdown_rx.recv().await;

        info!("Starting cleanup tasks (timeout: {:?})", shutdown_timeout);
        match tokio::time::timeout(shutdown_timeout, cleanup).await {
            Ok(()) => info!("Cleanup completed successfully"),
            Err(_) => {
                tracing::warn!(
                    "Cleanup exceeded timeout of {:?}, forcing shutdown",
                    shutdown_timeout
                );
            }
        }
    });

    let serve_result = axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(async move { signal_handle.wait_for_signal().await })
        .await
        .inspect_err(|e| {
            tracing::error!("Server encountered an error: {:?}", e);
        });

    // Server errors skip the signal; release the cleanup task either way.
    coordinator.shutdown();
    cleanup_handle.await.ok();

    serve_result
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::routing::get;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    #[derive(OpenApi)]
    #[openapi(info(title = "test"))]
    struct EmptyDoc;

    #[utoipa::path(get, path = "/ping", responses((status = 200, description = "pong")))]
    async fn ping() -> &'static str {
        "pong"
    }

    #[derive(OpenApi)]
    #[openapi(paths(ping))]
    struct PingDoc;

    fn apis() -> Router {
        Router::new().route("/ping", get(ping))
    }

    async fn call(router: Router, method: &str, uri: &str) -> (StatusCode, Vec<u8>) {
        let response = router
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, body.to_vec())
    }

    #[tokio::test]
    async fn test_routes_merged_at_root_without_base_path() {
        let router = create_router::<EmptyDoc>(apis(), &ServerConfig::default()).unwrap();
        let (status, body) = call(router, "GET", "/ping").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"pong");
    }

    #[tokio::test]
    async fn test_routes_nested_under_base_path() {
        let config = ServerConfig {
            base_path: Some("/api".to_string()),
            ..ServerConfig::default()
        };
        let router = create_router::<EmptyDoc>(apis(), &config).unwrap();

        let (status, _) = call(router.clone(), "GET", "/api/ping").await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = call(router, "GET", "/ping").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_openapi_paths_follow_base_path() {
        let doc = openapi_document::<PingDoc>(None);
        assert!(doc.paths.paths.contains_key("/ping"));

        let doc = openapi_document::<PingDoc>(Some("/api/"));
        assert!(doc.paths.paths.contains_key("/api/ping"));
        assert!(!doc.paths.paths.contains_key("/ping"));
    }

    #[tokio::test]
    async fn test_served_openapi_json_uses_base_path() {
        let config = ServerConfig {
            base_path: Some("/api".to_string()),
            ..ServerConfig::default()
        };
        let router = create_router::<PingDoc>(apis(), &config).unwrap();

        let (status, body) = call(router, "GET", "/api-docs/openapi.json").await;
        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert!(json["paths"].get("/api/ping").is_some());
        assert!(json["paths"].get("/ping").is_none());
    }

    #[tokio::test]
    async fn test_fallbacks_render_envelope() {
        let router = create_router::<EmptyDoc>(apis(), &ServerConfig::default()).unwrap();

        let (status, body) = call(router.clone(), "GET", "/missing").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["code"], "NOT_FOUND");

        let (status, body) = call(router, "DELETE", "/ping").await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["code"], "METHOD_NOT_ALLOWED");
    }

    #[test]
    fn test_invalid_cors_origin_is_rejected() {
        let config = ServerConfig {
            cors_allowed_origins: vec!["bad\norigin".to_string()],
            ..ServerConfig::default()
        };
        assert!(create_router::<EmptyDoc>(apis(), &config).is_err());
    }
}
