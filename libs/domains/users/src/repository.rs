use async_trait::async_trait;
use chrono::Utc;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use axum_helpers::pagination::page_offset;

use crate::error::{UserError, UserResult};
use crate::models::{NewUser, SortField, SortOrder, User, UserFilter, UserId};

/// Repository trait for User persistence
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a user and return it with its assigned identifier
    async fn create(&self, user: NewUser) -> UserResult<User>;

    async fn get_by_id(&self, id: UserId) -> UserResult<Option<User>>;

    /// One page of users matching the filter, in the filter's order
    async fn list(&self, filter: UserFilter) -> UserResult<Vec<User>>;

    /// Count users matching the filter, ignoring paging
    async fn count(&self, filter: UserFilter) -> UserResult<u64>;

    /// Persist a modified user; `NotFound` when the id no longer exists
    async fn update(&self, user: User) -> UserResult<User>;

    /// Returns whether a row was removed
    async fn delete(&self, id: UserId) -> UserResult<bool>;

    async fn username_exists(&self, username: &str) -> UserResult<bool>;
}

#[derive(Debug, Default)]
struct Store {
    next_id: UserId,
    users: BTreeMap<UserId, User>,
}

/// In-memory implementation of UserRepository (for development/testing)
#[derive(Debug, Default, Clone)]
pub struct InMemoryUserRepository {
    store: Arc<RwLock<Store>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn username_taken(store: &Store, username: &str, except: Option<UserId>) -> bool {
    let username = username.to_lowercase();
    store
        .users
        .values()
        .any(|u| Some(u.user_id) != except && u.username.to_lowercase() == username)
}

fn compare(a: &User, b: &User, field: SortField, order: SortOrder) -> Ordering {
    let primary = match field {
        SortField::UserId => a.user_id.cmp(&b.user_id),
        SortField::Username => a.username.to_lowercase().cmp(&b.username.to_lowercase()),
        SortField::CreateTime => a.create_time.cmp(&b.create_time),
        SortField::ModifyTime => a.modify_time.cmp(&b.modify_time),
    };
    let ordered = match order {
        SortOrder::Asc => primary,
        SortOrder::Desc => primary.reverse(),
    };
    ordered.then_with(|| a.user_id.cmp(&b.user_id))
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: NewUser) -> UserResult<User> {
        let mut store = self.store.write().await;

        if username_taken(&store, &user.username, None) {
            return Err(UserError::DuplicateUsername(user.username));
        }

        store.next_id += 1;
        let now = Utc::now();
        let created = User {
            user_id: store.next_id,
            username: user.username,
            password_hash: user.password_hash,
            locked: user.locked,
            create_time: now,
            modify_time: now,
        };
        store.users.insert(created.user_id, created.clone());

        tracing::info!(user_id = created.user_id, username = %created.username, "Created user");
        Ok(created)
    }

    async fn get_by_id(&self, id: UserId) -> UserResult<Option<User>> {
        let store = self.store.read().await;
        Ok(store.users.get(&id).cloned())
    }

    async fn list(&self, filter: UserFilter) -> UserResult<Vec<User>> {
        let store = self.store.read().await;

        let mut result: Vec<User> = store
            .users
            .values()
            .filter(|u| filter.matches(u))
            .cloned()
            .collect();

        result.sort_by(|a, b| compare(a, b, filter.sort_field, filter.sort_order));

        let offset = page_offset(filter.page_num, filter.page_size);
        Ok(result
            .into_iter()
            .skip(usize::try_from(offset).unwrap_or(usize::MAX))
            .take(usize::try_from(filter.page_size).unwrap_or(usize::MAX))
            .collect())
    }

    async fn count(&self, filter: UserFilter) -> UserResult<u64> {
        let store = self.store.read().await;
        let count = store.users.values().filter(|u| filter.matches(u)).count();
        Ok(count as u64)
    }

    async fn update(&self, user: User) -> UserResult<User> {
        let mut store = self.store.write().await;

        if !store.users.contains_key(&user.user_id) {
            return Err(UserError::NotFound(user.user_id));
        }
        if username_taken(&store, &user.username, Some(user.user_id)) {
            return Err(UserError::DuplicateUsername(user.username));
        }

        store.users.insert(user.user_id, user.clone());

        tracing::info!(user_id = user.user_id, "Updated user");
        Ok(user)
    }

    async fn delete(&self, id: UserId) -> UserResult<bool> {
        let mut store = self.store.write().await;
        let removed = store.users.remove(&id).is_some();

        if removed {
            tracing::info!(user_id = id, "Deleted user");
        }
        Ok(removed)
    }

    async fn username_exists(&self, username: &str) -> UserResult<bool> {
        let store = self.store.read().await;
        Ok(username_taken(&store, username, None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(username: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            password_hash: None,
            locked: false,
        }
    }

    #[tokio::test]
    async fn test_create_assigns_increasing_ids() {
        let repo = InMemoryUserRepository::new();
        let alice = repo.create(new_user("alice")).await.unwrap();
        let bob = repo.create(new_user("bob")).await.unwrap();

        assert_eq!(alice.user_id, 1);
        assert_eq!(bob.user_id, 2);
        assert_eq!(alice.create_time, alice.modify_time);
    }

    #[tokio::test]
    async fn test_ids_are_not_reused_after_delete() {
        let repo = InMemoryUserRepository::new();
        let first = repo.create(new_user("alice")).await.unwrap();
        assert!(repo.delete(first.user_id).await.unwrap());

        let second = repo.create(new_user("alice")).await.unwrap();
        assert_ne!(first.user_id, second.user_id);
    }

    #[tokio::test]
    async fn test_duplicate_username_case_insensitive() {
        let repo = InMemoryUserRepository::new();
        repo.create(new_user("alice")).await.unwrap();

        let result = repo.create(new_user("ALICE")).await;
        assert!(matches!(result, Err(UserError::DuplicateUsername(_))));
        assert!(repo.username_exists("Alice").await.unwrap());
    }

    #[tokio::test]
    async fn test_list_pages_and_sorts_with_id_tiebreak() {
        let repo = InMemoryUserRepository::new();
        for name in ["carol", "alice", "bob"] {
            repo.create(new_user(name)).await.unwrap();
        }

        let filter = UserFilter {
            sort_field: SortField::Username,
            sort_order: SortOrder::Asc,
            page_size: 2,
            ..UserFilter::default()
        };
        let names: Vec<_> = repo
            .list(filter.clone())
            .await
            .unwrap()
            .into_iter()
            .map(|u| u.username)
            .collect();
        assert_eq!(names, vec!["alice", "bob"]);

        let second_page = repo
            .list(UserFilter {
                page_num: 2,
                ..filter.clone()
            })
            .await
            .unwrap();
        assert_eq!(second_page.len(), 1);
        assert_eq!(second_page[0].username, "carol");

        let page_zero = repo
            .list(UserFilter {
                page_num: 0,
                ..filter.clone()
            })
            .await
            .unwrap();
        assert_eq!(page_zero.len(), 2);
        assert_eq!(page_zero[0].username, "alice");

        assert_eq!(repo.count(filter).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_list_by_id_desc() {
        let repo = InMemoryUserRepository::new();
        for name in ["a1", "a2", "a3"] {
            repo.create(new_user(name)).await.unwrap();
        }

        let ids: Vec<_> = repo
            .list(UserFilter {
                sort_field: SortField::UserId,
                ..UserFilter::default()
            })
            .await
            .unwrap()
            .into_iter()
            .map(|u| u.user_id)
            .collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }

    #[tokio::test]
    async fn test_update_missing_user() {
        let repo = InMemoryUserRepository::new();
        let mut ghost = repo.create(new_user("ghost")).await.unwrap();
        repo.delete(ghost.user_id).await.unwrap();

        ghost.locked = true;
        let result = repo.update(ghost).await;
        assert!(matches!(result, Err(UserError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_update_rejects_taken_username() {
        let repo = InMemoryUserRepository::new();
        repo.create(new_user("alice")).await.unwrap();
        let mut bob = repo.create(new_user("bob")).await.unwrap();

        bob.username = "Alice".to_string();
        let result = repo.update(bob).await;
        assert!(matches!(result, Err(UserError::DuplicateUsername(_))));
    }

    #[tokio::test]
    async fn test_delete_missing_returns_false() {
        let repo = InMemoryUserRepository::new();
        assert!(!repo.delete(99).await.unwrap());
    }
}
