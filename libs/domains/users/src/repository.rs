use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use validator::Validate;

use crate::error::{UserError, UserResult};
use crate::models::{NewUser, UpdateUser, User};

/// Repository trait for User persistence
///
/// Email uniqueness is the store's job: `create` and `update` report a
/// clash as [`UserError::DuplicateEmail`], never as a generic failure.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new user, assigning id and creation time
    async fn create(&self, input: NewUser) -> UserResult<User>;

    /// Get a user by ID
    async fn get_by_id(&self, id: i64) -> UserResult<Option<User>>;

    /// Get a user by exact email
    async fn get_by_email(&self, email: &str) -> UserResult<Option<User>>;

    /// All users ordered by id
    async fn list(&self) -> UserResult<Vec<User>>;

    /// Load, merge, re-validate and store atomically.
    ///
    /// Fails with `NotFound`, `Validation` or `DuplicateEmail`; nothing is
    /// written on failure.
    async fn update(&self, id: i64, input: UpdateUser) -> UserResult<User>;

    /// Delete a user, returning the removed record
    async fn delete(&self, id: i64) -> UserResult<Option<User>>;

    /// Count all users
    async fn count(&self) -> UserResult<u64>;
}

/// In-memory implementation of UserRepository (for development/testing)
#[derive(Debug, Default, Clone)]
pub struct InMemoryUserRepository {
    state: Arc<RwLock<State>>,
}

#[derive(Debug, Default)]
struct State {
    next_id: i64,
    users: BTreeMap<i64, User>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, input: NewUser) -> UserResult<User> {
        let mut state = self.state.write().await;

        if state.users.values().any(|u| u.email == input.email) {
            return Err(UserError::DuplicateEmail(input.email));
        }

        state.next_id += 1;
        let user = User {
            id: state.next_id,
            email: input.email,
            name: input.name,
            age: input.age,
            created_at: Utc::now(),
        };
        state.users.insert(user.id, user.clone());

        tracing::info!(user_id = %user.id, email = %user.email, "Created user");
        Ok(user)
    }

    async fn get_by_id(&self, id: i64) -> UserResult<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.get(&id).cloned())
    }

    async fn get_by_email(&self, email: &str) -> UserResult<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.values().find(|u| u.email == email).cloned())
    }

    async fn list(&self) -> UserResult<Vec<User>> {
        let state = self.state.read().await;
        Ok(state.users.values().cloned().collect())
    }

    async fn update(&self, id: i64, input: UpdateUser) -> UserResult<User> {
        let mut state = self.state.write().await;

        let mut user = state.users.get(&id).cloned().ok_or(UserError::NotFound(id))?;
        user.apply_update(input);
        user.validate()?;

        if state.users.values().any(|u| u.id != id && u.email == user.email) {
            return Err(UserError::DuplicateEmail(user.email));
        }

        state.users.insert(id, user.clone());

        tracing::info!(user_id = %id, "Updated user");
        Ok(user)
    }

    async fn delete(&self, id: i64) -> UserResult<Option<User>> {
        let mut state = self.state.write().await;
        let removed = state.users.remove(&id);

        if removed.is_some() {
            tracing::info!(user_id = %id, "Deleted user");
        }
        Ok(removed)
    }

    async fn count(&self) -> UserResult<u64> {
        let state = self.state.read().await;
        Ok(state.users.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            name: "Ada Lovelace".to_string(),
            age: 36,
        }
    }

    #[tokio::test]
    async fn test_create_assigns_increasing_ids() {
        let repo = InMemoryUserRepository::new();

        let first = repo.create(new_user("a@example.com")).await.unwrap();
        let second = repo.create(new_user("b@example.com")).await.unwrap();

        assert!(second.id > first.id);
        assert_eq!(repo.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_duplicate_email_error() {
        let repo = InMemoryUserRepository::new();
        repo.create(new_user("a@example.com")).await.unwrap();

        let result = repo.create(new_user("a@example.com")).await;
        assert!(matches!(result, Err(UserError::DuplicateEmail(e)) if e == "a@example.com"));
    }

    #[tokio::test]
    async fn test_update_to_other_users_email_conflicts() {
        let repo = InMemoryUserRepository::new();
        repo.create(new_user("a@example.com")).await.unwrap();
        let b = repo.create(new_user("b@example.com")).await.unwrap();

        let result = repo
            .update(
                b.id,
                UpdateUser {
                    email: Some("a@example.com".into()),
                    ..Default::default()
                },
            )
            .await;

        assert!(matches!(result, Err(UserError::DuplicateEmail(_))));
        let unchanged = repo.get_by_id(b.id).await.unwrap().unwrap();
        assert_eq!(unchanged.email, "b@example.com");
    }

    #[tokio::test]
    async fn test_update_keeping_own_email_succeeds() {
        let repo = InMemoryUserRepository::new();
        let a = repo.create(new_user("a@example.com")).await.unwrap();

        let updated = repo
            .update(
                a.id,
                UpdateUser {
                    email: Some("a@example.com".into()),
                    age: Some(50),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.age, 50);
        assert_eq!(updated.created_at, a.created_at);
    }

    #[tokio::test]
    async fn test_update_missing_user() {
        let repo = InMemoryUserRepository::new();
        let result = repo.update(99, UpdateUser::default()).await;
        assert!(matches!(result, Err(UserError::NotFound(99))));
    }

    #[tokio::test]
    async fn test_delete_returns_removed_user() {
        let repo = InMemoryUserRepository::new();
        let a = repo.create(new_user("a@example.com")).await.unwrap();

        let removed = repo.delete(a.id).await.unwrap().unwrap();
        assert_eq!(removed.email, "a@example.com");
        assert!(repo.delete(a.id).await.unwrap().is_none());
    }
}
