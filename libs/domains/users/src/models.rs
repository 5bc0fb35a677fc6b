use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

/// User identifier, assigned by the store and never reused.
pub type UserId = i64;

/// Stored user record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub user_id: UserId,
    /// Unique, compared case-insensitively
    pub username: String,
    /// Argon2 password hash (never exposed in API responses)
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    pub locked: bool,
    pub create_time: DateTime<Utc>,
    pub modify_time: DateTime<Utc>,
}

impl User {
    /// Apply updates (password should already be hashed if provided)
    pub fn apply_update(&mut self, update: UpdateUser, password_hash: Option<String>) {
        if let Some(username) = update.username {
            self.username = username.trim().to_string();
        }
        if let Some(hash) = password_hash {
            self.password_hash = Some(hash);
        }
        if let Some(locked) = update.locked {
            self.locked = locked;
        }
        self.modify_time = Utc::now();
    }
}

/// Read-only projection returned to callers; carries no password material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub user_id: UserId,
    pub username: String,
    pub locked: bool,
    pub create_time: DateTime<Utc>,
    pub modify_time: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            user_id: user.user_id,
            username: user.username,
            locked: user.locked,
            create_time: user.create_time,
            modify_time: user.modify_time,
        }
    }
}

/// DTO for creating a new user
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUser {
    #[validate(
        length(min = 1, max = 64),
        custom(function = "not_blank")
    )]
    pub username: String,
    #[validate(length(min = 8, max = 128), custom(function = "password_strength"))]
    pub password: Option<String>,
}

/// DTO for updating an existing user.
///
/// `user_id` is accepted in the body but always replaced by the path
/// identifier before the update is forwarded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUser {
    #[serde(default)]
    pub user_id: Option<UserId>,
    #[validate(
        length(min = 1, max = 64),
        custom(function = "not_blank")
    )]
    pub username: Option<String>,
    #[validate(length(min = 8, max = 128), custom(function = "password_strength"))]
    pub password: Option<String>,
    pub locked: Option<bool>,
}

impl UpdateUser {
    pub fn with_user_id(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }
}

/// Column a user listing is ordered by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    UserId,
    Username,
    #[default]
    CreateTime,
    ModifyTime,
}

impl SortField {
    pub fn column(&self) -> &'static str {
        match self {
            SortField::UserId => "user_id",
            SortField::Username => "username",
            SortField::CreateTime => "create_time",
            SortField::ModifyTime => "modify_time",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn keyword(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Query filters for listing users
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Validate, ToSchema, utoipa::IntoParams)]
#[serde(default, rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct UserFilter {
    /// Case-insensitive substring match on username
    #[validate(length(max = 64))]
    pub username: Option<String>,
    pub locked: Option<bool>,
    /// 1-based page number
    #[validate(range(min = 1))]
    pub page_num: u64,
    #[validate(range(min = 1, max = 100))]
    pub page_size: u64,
    pub sort_field: SortField,
    pub sort_order: SortOrder,
}

impl Default for UserFilter {
    fn default() -> Self {
        Self {
            username: None,
            locked: None,
            page_num: 1,
            page_size: 10,
            sort_field: SortField::default(),
            sort_order: SortOrder::default(),
        }
    }
}

impl UserFilter {
    /// Blank username filters are treated as absent.
    pub fn username_pattern(&self) -> Option<String> {
        self.username
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
    }

    pub fn matches(&self, user: &User) -> bool {
        if let Some(pattern) = self.username_pattern() {
            if !user.username.to_lowercase().contains(&pattern) {
                return false;
            }
        }
        if let Some(locked) = self.locked {
            if user.locked != locked {
                return false;
            }
        }
        true
    }
}

/// Existence check by username
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Validate, ToSchema, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct UserCheck {
    #[validate(
        length(min = 1, max = 64),
        custom(function = "not_blank")
    )]
    pub username: String,
}

/// Record handed to the repository on create (password already hashed).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub password_hash: Option<String>,
    pub locked: bool,
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank").with_message("must not be blank".into()));
    }
    Ok(())
}

fn password_strength(value: &str) -> Result<(), ValidationError> {
    let has_letter = value.chars().any(|c| c.is_alphabetic());
    let has_digit = value.chars().any(|c| c.is_ascii_digit());

    if !has_letter || !has_digit {
        return Err(ValidationError::new("password_strength")
            .with_message("must contain at least one letter and one digit".into()));
    }
    Ok(())
}
