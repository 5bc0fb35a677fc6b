use async_trait::async_trait;
use axum_helpers::pagination::page_offset;
use chrono::{DateTime, Utc};
use sea_orm::{
    ConnectionTrait, DatabaseConnection, DbBackend, DbErr, FromQueryResult, SqlErr, Statement,
    Value,
};

use crate::error::{UserError, UserResult};
use crate::models::{NewUser, User, UserFilter, UserId};
use crate::repository::UserRepository;

const USER_COLUMNS: &str = "user_id, username, password_hash, locked, create_time, modify_time";

/// PostgreSQL implementation of UserRepository using SeaORM
#[derive(Clone)]
pub struct PostgresUserRepository {
    db: DatabaseConnection,
}

impl PostgresUserRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

/// Helper struct for deserializing user rows from the database
#[derive(Debug, FromQueryResult)]
struct UserRow {
    user_id: i64,
    username: String,
    password_hash: Option<String>,
    locked: bool,
    create_time: DateTime<Utc>,
    modify_time: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            user_id: row.user_id,
            username: row.username,
            password_hash: row.password_hash,
            locked: row.locked,
            create_time: row.create_time,
            modify_time: row.modify_time,
        }
    }
}

#[derive(FromQueryResult)]
struct CountRow {
    count: i64,
}

#[derive(FromQueryResult)]
struct ExistsRow {
    exists: bool,
}

/// Unique violations become `DuplicateUsername`, everything else `Database`.
fn map_write_error(err: DbErr, username: &str) -> UserError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            UserError::DuplicateUsername(username.to_string())
        }
        _ => err.into(),
    }
}

/// Escape LIKE wildcards so the filter is a literal substring match.
fn like_pattern(needle: &str) -> String {
    let escaped = needle
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

/// WHERE clause and its bound values for a filter, numbered from `$1`.
fn where_clause(filter: &UserFilter) -> (String, Vec<Value>) {
    let mut conditions = Vec::new();
    let mut values: Vec<Value> = Vec::new();

    if let Some(pattern) = filter.username_pattern() {
        values.push(like_pattern(&pattern).into());
        conditions.push(format!("lower(username) LIKE ${} ESCAPE '\\'", values.len()));
    }
    if let Some(locked) = filter.locked {
        values.push(locked.into());
        conditions.push(format!("locked = ${}", values.len()));
    }

    let clause = if conditions.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", conditions.join(" AND "))
    };
    (clause, values)
}

fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

/// Paged SELECT for a filter; LIMIT and OFFSET are the last two bound values.
fn list_statement(filter: &UserFilter) -> Statement {
    let (clause, mut values) = where_clause(filter);

    let offset = page_offset(filter.page_num, filter.page_size);
    values.push(to_i64(filter.page_size).into());
    let limit_idx = values.len();
    values.push(to_i64(offset).into());
    let offset_idx = values.len();

    // Sort column and direction come from closed enums, never from raw input.
    let sql = format!(
        "SELECT {} FROM users{} ORDER BY {} {}, user_id ASC LIMIT ${} OFFSET ${}",
        USER_COLUMNS,
        clause,
        filter.sort_field.column(),
        filter.sort_order.keyword(),
        limit_idx,
        offset_idx
    );

    Statement::from_sql_and_values(DbBackend::Postgres, sql, values)
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn create(&self, user: NewUser) -> UserResult<User> {
        let sql = format!(
            "INSERT INTO users (username, password_hash, locked) VALUES ($1, $2, $3) RETURNING {}",
            USER_COLUMNS
        );

        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            sql,
            [
                user.username.clone().into(),
                user.password_hash.clone().into(),
                user.locked.into(),
            ],
        );

        let row = UserRow::find_by_statement(stmt)
            .one(&self.db)
            .await
            .map_err(|e| map_write_error(e, &user.username))?
            .ok_or_else(|| UserError::Internal("Failed to create user".to_string()))?;

        tracing::info!(user_id = row.user_id, username = %row.username, "Created user");
        Ok(row.into())
    }

    async fn get_by_id(&self, id: UserId) -> UserResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE user_id = $1", USER_COLUMNS);

        let stmt = Statement::from_sql_and_values(DbBackend::Postgres, sql, [id.into()]);

        let row = UserRow::find_by_statement(stmt).one(&self.db).await?;
        Ok(row.map(|r| r.into()))
    }

    async fn list(&self, filter: UserFilter) -> UserResult<Vec<User>> {
        let stmt = list_statement(&filter);

        let rows = UserRow::find_by_statement(stmt).all(&self.db).await?;
        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    async fn count(&self, filter: UserFilter) -> UserResult<u64> {
        let (clause, values) = where_clause(&filter);
        let sql = format!("SELECT COUNT(*) AS count FROM users{}", clause);

        let stmt = Statement::from_sql_and_values(DbBackend::Postgres, sql, values);

        let result = CountRow::find_by_statement(stmt).one(&self.db).await?;
        Ok(result
            .map(|r| u64::try_from(r.count).unwrap_or_default())
            .unwrap_or(0))
    }

    async fn update(&self, user: User) -> UserResult<User> {
        let sql = format!(
            "UPDATE users SET username = $2, password_hash = $3, locked = $4, modify_time = $5 \
             WHERE user_id = $1 RETURNING {}",
            USER_COLUMNS
        );

        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            sql,
            [
                user.user_id.into(),
                user.username.clone().into(),
                user.password_hash.clone().into(),
                user.locked.into(),
                user.modify_time.into(),
            ],
        );

        let row = UserRow::find_by_statement(stmt)
            .one(&self.db)
            .await
            .map_err(|e| map_write_error(e, &user.username))?;

        row.map(|r| r.into()).ok_or(UserError::NotFound(user.user_id))
    }

    async fn delete(&self, id: UserId) -> UserResult<bool> {
        let sql = "DELETE FROM users WHERE user_id = $1";

        let stmt = Statement::from_sql_and_values(DbBackend::Postgres, sql, [id.into()]);

        let result = self.db.execute_raw(stmt).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn username_exists(&self, username: &str) -> UserResult<bool> {
        let sql = "SELECT EXISTS(SELECT 1 FROM users WHERE lower(username) = lower($1)) AS exists";

        let stmt = Statement::from_sql_and_values(DbBackend::Postgres, sql, [username.into()]);

        let result = ExistsRow::find_by_statement(stmt).one(&self.db).await?;
        Ok(result.map(|r| r.exists).unwrap_or(false))
    }
}
