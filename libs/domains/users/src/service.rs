use argon2::{
    Argon2,
    password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
};
use async_trait::async_trait;
use axum_helpers::PageInfo;
use std::sync::Arc;

use crate::error::{UserError, UserResult};
use crate::models::{CreateUser, NewUser, UpdateUser, UserCheck, UserFilter, UserId, UserResponse};
use crate::repository::UserRepository;

/// User-management use cases consumed by the HTTP layer.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserManagement: Send + Sync {
    /// `NotFound` when no user has this id
    async fn query_user(&self, user_id: UserId) -> UserResult<UserResponse>;

    async fn query_users(&self, filter: UserFilter) -> UserResult<PageInfo<UserResponse>>;

    /// Returns the newly assigned identifier
    async fn create_user(&self, input: CreateUser) -> UserResult<UserId>;

    async fn check_user_exist(&self, check: UserCheck) -> UserResult<bool>;

    async fn update_user(&self, user_id: UserId, input: UpdateUser) -> UserResult<()>;

    async fn delete_user(&self, user_id: UserId) -> UserResult<()>;
}

/// Service layer for User business logic
#[derive(Clone)]
pub struct UserService<R: UserRepository> {
    repository: Arc<R>,
}

impl<R: UserRepository> UserService<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository: Arc::new(repository),
        }
    }

    fn hash_password(&self, password: &str) -> UserResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();

        argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| UserError::PasswordHash(e.to_string()))
    }

    fn hash_optional(&self, password: Option<&str>) -> UserResult<Option<String>> {
        password.map(|p| self.hash_password(p)).transpose()
    }
}

fn normalize_username(username: &str) -> UserResult<String> {
    let trimmed = username.trim();
    if trimmed.is_empty() {
        return Err(UserError::Validation("Username must not be blank".to_string()));
    }
    Ok(trimmed.to_string())
}

#[async_trait]
impl<R: UserRepository> UserManagement for UserService<R> {
    async fn query_user(&self, user_id: UserId) -> UserResult<UserResponse> {
        let user = self
            .repository
            .get_by_id(user_id)
            .await?
            .ok_or(UserError::NotFound(user_id))?;

        Ok(user.into())
    }

    async fn query_users(&self, filter: UserFilter) -> UserResult<PageInfo<UserResponse>> {
        let total = self.repository.count(filter.clone()).await?;
        let (page_num, page_size) = (filter.page_num, filter.page_size);
        let users = self.repository.list(filter).await?;

        Ok(PageInfo::new(users, total, page_num, page_size).map(UserResponse::from))
    }

    async fn create_user(&self, input: CreateUser) -> UserResult<UserId> {
        let username = normalize_username(&input.username)?;

        if self.repository.username_exists(&username).await? {
            return Err(UserError::DuplicateUsername(username));
        }

        let password_hash = self.hash_optional(input.password.as_deref())?;

        let created = self
            .repository
            .create(NewUser {
                username,
                password_hash,
                locked: false,
            })
            .await?;

        Ok(created.user_id)
    }

    async fn check_user_exist(&self, check: UserCheck) -> UserResult<bool> {
        let username = normalize_username(&check.username)?;
        self.repository.username_exists(&username).await
    }

    async fn update_user(&self, user_id: UserId, input: UpdateUser) -> UserResult<()> {
        let mut user = self
            .repository
            .get_by_id(user_id)
            .await?
            .ok_or(UserError::NotFound(user_id))?;

        let mut input = input;
        if let Some(ref requested) = input.username {
            let username = normalize_username(requested)?;
            let renamed = username.to_lowercase() != user.username.to_lowercase();
            if renamed && self.repository.username_exists(&username).await? {
                return Err(UserError::DuplicateUsername(username));
            }
            input.username = Some(username);
        }

        let password_hash = self.hash_optional(input.password.as_deref())?;
        user.apply_update(input, password_hash);

        self.repository.update(user).await?;
        Ok(())
    }

    async fn delete_user(&self, user_id: UserId) -> UserResult<()> {
        let deleted = self.repository.delete(user_id).await?;

        if !deleted {
            return Err(UserError::NotFound(user_id));
        }

        Ok(())
    }
}
