use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    components(
        schemas(axum_helpers::ErrorResponse)
    ),
    info(
        title = "Lineage API",
        version = "0.1.0",
        description = "User management API with a uniform response envelope and audit trail"
    ),
    nest(
        (path = "/users", api = domain_users::ApiDoc)
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_paths_are_documented() {
        let doc = ApiDoc::openapi();
        let paths = &doc.paths.paths;

        for path in ["/users", "/users/exist", "/users/{user_id}"] {
            assert!(paths.contains_key(path), "missing {}", path);
        }
    }
}
