use axum::{
    Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::get,
};
use axum_helpers::{
    ApiMessage, ApiResponse, AuditScope, AuditSink, IdPath, OperationType, PageInfo,
    ResultMessage, ValidatedJson, ValidatedQuery,
    errors::responses::{
        BadRequestPathResponse, BadRequestValidationResponse, ConflictResponse,
        InternalServerErrorResponse, NotFoundResponse,
    },
};
use std::sync::Arc;
use utoipa::OpenApi;

use crate::error::UserResult;
use crate::models::{
    CreateUser, SortField, SortOrder, UpdateUser, UserCheck, UserFilter, UserId, UserResponse,
};
use crate::service::UserManagement;

/// Audit module name for every event emitted by this router
pub const AUDIT_MODULE: &str = "USERS";

/// OpenAPI documentation for Users API
#[derive(OpenApi)]
#[openapi(
    paths(
        query_users,
        create_user,
        check_user_exist,
        query_user,
        update_user,
        delete_user,
    ),
    components(
        schemas(
            UserResponse,
            CreateUser,
            UpdateUser,
            UserFilter,
            UserCheck,
            SortField,
            SortOrder,
            ApiMessage,
            ResultMessage
        ),
        responses(
            NotFoundResponse,
            ConflictResponse,
            BadRequestValidationResponse,
            BadRequestPathResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = "users", description = "User management endpoints")
    )
)]
pub struct ApiDoc;

/// Shared handler state: the user service plus the audit destination.
pub struct UsersState<S> {
    pub service: Arc<S>,
    pub audit: Arc<dyn AuditSink>,
}

impl<S> Clone for UsersState<S> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            audit: self.audit.clone(),
        }
    }
}

impl<S> UsersState<S> {
    fn scope(&self, operation: OperationType, headers: &HeaderMap) -> AuditScope {
        AuditScope::new(self.audit.clone(), AUDIT_MODULE, operation).with_request(headers)
    }
}

fn resource(user_id: UserId) -> String {
    format!("user:{}", user_id)
}

/// Create the users router with all HTTP endpoints
pub fn router<S>(service: S, audit: Arc<dyn AuditSink>) -> Router
where
    S: UserManagement + 'static,
{
    let state = UsersState {
        service: Arc::new(service),
        audit,
    };

    Router::new()
        .route("/", get(query_users::<S>).post(create_user::<S>))
        .route("/exist", get(check_user_exist::<S>))
        .route(
            "/{user_id}",
            get(query_user::<S>)
                .put(update_user::<S>)
                .delete(delete_user::<S>),
        )
        .with_state(state)
}

/// Get a user by ID
#[utoipa::path(
    get,
    path = "/{user_id}",
    tag = "users",
    params(
        ("user_id" = i64, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User found", body = ApiResponse<UserResponse>),
        (status = 400, response = BadRequestPathResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn query_user<S: UserManagement>(
    State(state): State<UsersState<S>>,
    headers: HeaderMap,
    IdPath(user_id): IdPath,
) -> UserResult<ApiResponse<UserResponse>> {
    let user = state
        .scope(OperationType::Query, &headers)
        .with_resource(resource(user_id))
        .run(state.service.query_user(user_id), |user| {
            format!("Query User: {}", user.username)
        })
        .await?;

    Ok(ApiResponse::success(ResultMessage::DetailSuccess, user))
}

/// List users with filters, paging and sorting
#[utoipa::path(
    get,
    path = "",
    tag = "users",
    params(UserFilter),
    responses(
        (status = 200, description = "One page of users", body = ApiResponse<PageInfo<UserResponse>>),
        (status = 400, response = BadRequestValidationResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn query_users<S: UserManagement>(
    State(state): State<UsersState<S>>,
    headers: HeaderMap,
    ValidatedQuery(filter): ValidatedQuery<UserFilter>,
) -> UserResult<ApiResponse<PageInfo<UserResponse>>> {
    let page = state
        .scope(OperationType::Query, &headers)
        .run(state.service.query_users(filter), |_| "Query Users".to_string())
        .await?;

    Ok(ApiResponse::success(ResultMessage::QuerySuccess, page))
}

/// Create a new user
#[utoipa::path(
    post,
    path = "",
    tag = "users",
    request_body = CreateUser,
    responses(
        (status = 201, description = "User created, returns its ID", body = ApiResponse<i64>),
        (status = 400, response = BadRequestValidationResponse),
        (status = 409, response = ConflictResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn create_user<S: UserManagement>(
    State(state): State<UsersState<S>>,
    headers: HeaderMap,
    ValidatedJson(input): ValidatedJson<CreateUser>,
) -> UserResult<(StatusCode, ApiResponse<UserId>)> {
    let username = input.username.trim().to_string();
    let user_id = state.service.create_user(input).await?;

    state
        .scope(OperationType::Create, &headers)
        .with_resource(resource(user_id))
        .record(format!("Create User: {}", username))
        .await;

    Ok(ApiResponse::created(ResultMessage::CreateSuccess, user_id))
}

/// Check whether a username is taken
#[utoipa::path(
    get,
    path = "/exist",
    tag = "users",
    params(UserCheck),
    responses(
        (status = 200, description = "Whether the username exists", body = ApiResponse<bool>),
        (status = 400, response = BadRequestValidationResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn check_user_exist<S: UserManagement>(
    State(state): State<UsersState<S>>,
    headers: HeaderMap,
    ValidatedQuery(check): ValidatedQuery<UserCheck>,
) -> UserResult<ApiResponse<bool>> {
    let exists = state
        .scope(OperationType::Query, &headers)
        .run(state.service.check_user_exist(check), |_| {
            "Check User Exist".to_string()
        })
        .await?;

    Ok(ApiResponse::success(ResultMessage::CheckSuccess, exists))
}

/// Update a user
///
/// The path ID always wins over any `userId` in the body.
#[utoipa::path(
    put,
    path = "/{user_id}",
    tag = "users",
    params(
        ("user_id" = i64, Path, description = "User ID")
    ),
    request_body = UpdateUser,
    responses(
        (status = 200, description = "User updated", body = ApiMessage),
        (status = 400, response = BadRequestValidationResponse),
        (status = 404, response = NotFoundResponse),
        (status = 409, response = ConflictResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn update_user<S: UserManagement>(
    State(state): State<UsersState<S>>,
    headers: HeaderMap,
    IdPath(user_id): IdPath,
    ValidatedJson(input): ValidatedJson<UpdateUser>,
) -> UserResult<ApiMessage> {
    // Audit description names the user as stored before the change.
    let existing = state.service.query_user(user_id).await?;
    let description = format!("Update User: {}", existing.username);

    state
        .scope(OperationType::Update, &headers)
        .with_resource(resource(user_id))
        .run(
            state
                .service
                .update_user(user_id, input.with_user_id(user_id)),
            |_| description,
        )
        .await?;

    Ok(ResultMessage::UpdateSuccess.into())
}

/// Delete a user
#[utoipa::path(
    delete,
    path = "/{user_id}",
    tag = "users",
    params(
        ("user_id" = i64, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User deleted", body = ApiMessage),
        (status = 400, response = BadRequestPathResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn delete_user<S: UserManagement>(
    State(state): State<UsersState<S>>,
    headers: HeaderMap,
    IdPath(user_id): IdPath,
) -> UserResult<ApiMessage> {
    let existing = state.service.query_user(user_id).await?;
    let description = format!("Delete User: {}", existing.username);

    state
        .scope(OperationType::Delete, &headers)
        .with_resource(resource(user_id))
        .run(state.service.delete_user(user_id), |_| description)
        .await?;

    Ok(ResultMessage::DeleteSuccess.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::UserError;
    use crate::service::MockUserManagement;
    use axum::body::Body;
    use axum::http::{Method, Request};
    use axum_helpers::MemoryAuditSink;
    use chrono::Utc;
    use http_body_util::BodyExt;
    use mockall::predicate::eq;
    use serde_json::Value;
    use tower::ServiceExt;

    fn view(user_id: UserId, username: &str) -> UserResponse {
        let now = Utc::now();
        UserResponse {
            user_id,
            username: username.to_string(),
            locked: false,
            create_time: now,
            modify_time: now,
        }
    }

    fn app(service: MockUserManagement) -> (Router, MemoryAuditSink) {
        let sink = MemoryAuditSink::new();
        (router(service, Arc::new(sink.clone())), sink)
    }

    async fn send(app: Router, method: Method, uri: &str, body: Option<&str>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = app.oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    #[tokio::test]
    async fn test_get_user_wraps_detail_and_audits() {
        let mut service = MockUserManagement::new();
        service
            .expect_query_user()
            .with(eq(42))
            .times(1)
            .returning(|id| Ok(view(id, "alice")));

        let (app, sink) = app(service);
        let (status, body) = send(app, Method::GET, "/42", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["code"], "DETAIL_SUCCESS");
        assert_eq!(body["data"]["username"], "alice");

        let events = sink.events().await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].description, "Query User: alice");
        assert_eq!(events[0].module, "USERS");
        assert_eq!(events[0].operation, OperationType::Query);
        assert_eq!(events[0].resource.as_deref(), Some("user:42"));
    }

    #[tokio::test]
    async fn test_get_user_not_found_leaves_no_audit() {
        let mut service = MockUserManagement::new();
        service
            .expect_query_user()
            .returning(|id| Err(UserError::NotFound(id)));

        let (app, sink) = app(service);
        let (status, body) = send(app, Method::GET, "/7", None).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "NOT_FOUND");
        assert!(sink.events().await.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_path_id_never_reaches_service() {
        let mut service = MockUserManagement::new();
        service.expect_query_user().times(0);
        service.expect_delete_user().times(0);

        let (app, sink) = app(service);
        let (status, body) = send(app.clone(), Method::GET, "/abc", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_PATH_PARAM");

        let (status, _) = send(app, Method::DELETE, "/-3", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(sink.events().await.is_empty());
    }

    #[tokio::test]
    async fn test_create_user_returns_created_id() {
        let mut service = MockUserManagement::new();
        service
            .expect_create_user()
            .withf(|input: &CreateUser| input.username == "alice")
            .times(1)
            .returning(|_| Ok(11));

        let (app, sink) = app(service);
        let (status, body) = send(app, Method::POST, "/", Some(r#"{"username":"alice"}"#)).await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["code"], "CREATE_SUCCESS");
        assert_eq!(body["data"], 11);

        let events = sink.events().await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].description, "Create User: alice");
        assert_eq!(events[0].operation, OperationType::Create);
        assert_eq!(events[0].resource.as_deref(), Some("user:11"));
    }

    #[tokio::test]
    async fn test_create_user_validation_failure_skips_service() {
        let mut service = MockUserManagement::new();
        service.expect_create_user().times(0);

        let (app, sink) = app(service);
        let (status, body) = send(app, Method::POST, "/", Some(r#"{"username":"   "}"#)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert!(body["data"]["username"].is_array());
        assert!(sink.events().await.is_empty());
    }

    #[tokio::test]
    async fn test_create_user_conflict() {
        let mut service = MockUserManagement::new();
        service
            .expect_create_user()
            .returning(|input| Err(UserError::DuplicateUsername(input.username)));

        let (app, sink) = app(service);
        let (status, body) = send(app, Method::POST, "/", Some(r#"{"username":"alice"}"#)).await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "CONFLICT");
        assert!(sink.events().await.is_empty());
    }

    #[tokio::test]
    async fn test_update_user_path_id_overrides_body() {
        let mut service = MockUserManagement::new();
        service
            .expect_query_user()
            .with(eq(42))
            .returning(|id| Ok(view(id, "alice")));
        service
            .expect_update_user()
            .withf(|id, input| *id == 42 && input.user_id == Some(42))
            .times(1)
            .returning(|_, _| Ok(()));

        let (app, sink) = app(service);
        let (status, body) = send(
            app,
            Method::PUT,
            "/42",
            Some(r#"{"userId":99,"username":"alicia"}"#),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["code"], "UPDATE_SUCCESS");
        assert!(body["data"].is_null());
        assert_eq!(sink.descriptions().await, vec!["Update User: alice"]);
    }

    #[tokio::test]
    async fn test_update_missing_user_skips_update_and_audit() {
        let mut service = MockUserManagement::new();
        service
            .expect_query_user()
            .returning(|id| Err(UserError::NotFound(id)));
        service.expect_update_user().times(0);

        let (app, sink) = app(service);
        let (status, _) = send(app, Method::PUT, "/5", Some(r#"{"locked":true}"#)).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(sink.events().await.is_empty());
    }

    #[tokio::test]
    async fn test_delete_user_audits_pre_delete_name() {
        let mut service = MockUserManagement::new();
        service
            .expect_query_user()
            .returning(|id| Ok(view(id, "bob")));
        service
            .expect_delete_user()
            .with(eq(3))
            .times(1)
            .returning(|_| Ok(()));

        let (app, sink) = app(service);
        let (status, body) = send(app, Method::DELETE, "/3", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["code"], "DELETE_SUCCESS");
        assert_eq!(sink.descriptions().await, vec!["Delete User: bob"]);
    }

    #[tokio::test]
    async fn test_delete_failure_leaves_no_audit() {
        let mut service = MockUserManagement::new();
        service
            .expect_query_user()
            .returning(|id| Ok(view(id, "bob")));
        service
            .expect_delete_user()
            .returning(|_| Err(UserError::Database("connection reset".to_string())));

        let (app, sink) = app(service);
        let (status, body) = send(app, Method::DELETE, "/3", None).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["code"], "DATABASE_ERROR");
        assert!(sink.events().await.is_empty());
    }

    #[tokio::test]
    async fn test_check_user_exist() {
        let mut service = MockUserManagement::new();
        service
            .expect_check_user_exist()
            .withf(|check: &UserCheck| check.username == "carol")
            .returning(|_| Ok(true));

        let (app, sink) = app(service);
        let (status, body) = send(app, Method::GET, "/exist?username=carol", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["code"], "CHECK_SUCCESS");
        assert_eq!(body["data"], true);
        assert_eq!(sink.descriptions().await, vec!["Check User Exist"]);
    }

    #[tokio::test]
    async fn test_check_user_exist_requires_username() {
        let mut service = MockUserManagement::new();
        service.expect_check_user_exist().times(0);

        let (app, _) = app(service);
        let (status, _) = send(app, Method::GET, "/exist", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_list_users_forwards_filter() {
        let mut service = MockUserManagement::new();
        service
            .expect_query_users()
            .withf(|filter: &UserFilter| {
                filter.page_num == 2
                    && filter.page_size == 5
                    && filter.sort_field == SortField::Username
                    && filter.sort_order == SortOrder::Asc
                    && filter.locked == Some(false)
            })
            .returning(|filter| {
                Ok(PageInfo::new(
                    vec![view(1, "alice")],
                    6,
                    filter.page_num,
                    filter.page_size,
                ))
            });

        let (app, sink) = app(service);
        let (status, body) = send(
            app,
            Method::GET,
            "/?pageNum=2&pageSize=5&sortField=username&sortOrder=asc&locked=false",
            None,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["code"], "QUERY_SUCCESS");
        assert_eq!(body["data"]["total"], 6);
        assert_eq!(body["data"]["pages"], 2);
        assert_eq!(body["data"]["list"][0]["username"], "alice");
        assert_eq!(sink.descriptions().await, vec!["Query Users"]);
    }

    #[tokio::test]
    async fn test_list_users_rejects_oversized_page() {
        let mut service = MockUserManagement::new();
        service.expect_query_users().times(0);

        let (app, _) = app(service);
        let (status, body) = send(app, Method::GET, "/?pageSize=500", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }
}
