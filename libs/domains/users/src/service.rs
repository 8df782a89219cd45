use std::sync::Arc;

use crate::error::{UserError, UserResult};
use crate::events::{UserEvent, UserEventDispatcher};
use crate::models::{CreateUser, UpdateUser, UserResponse};
use crate::repository::UserRepository;

/// Service layer for User business logic
///
/// Creation and deletion announce a change event once the store has
/// committed. Publication problems are absorbed by the dispatcher and never
/// surface here.
#[derive(Clone)]
pub struct UserService<R: UserRepository> {
    repository: Arc<R>,
    events: Arc<UserEventDispatcher>,
}

impl<R: UserRepository> UserService<R> {
    pub fn new(repository: R, events: Arc<UserEventDispatcher>) -> Self {
        Self {
            repository: Arc::new(repository),
            events,
        }
    }

    pub fn events(&self) -> &UserEventDispatcher {
        &self.events
    }

    /// Validate, insert and announce `CREATED`
    pub async fn create_user(&self, input: CreateUser) -> UserResult<UserResponse> {
        let new_user = input.into_new_user()?;
        let user = self.repository.create(new_user).await?;

        self.events.announce(UserEvent::created(&user.email)).await;

        Ok(user.into())
    }

    /// Get a user by ID
    pub async fn get_user(&self, id: i64) -> UserResult<UserResponse> {
        let user = self
            .repository
            .get_by_id(id)
            .await?
            .ok_or(UserError::NotFound(id))?;

        Ok(user.into())
    }

    /// Get a user by exact email
    pub async fn get_user_by_email(&self, email: &str) -> UserResult<UserResponse> {
        let user = self
            .repository
            .get_by_email(email)
            .await?
            .ok_or_else(|| UserError::EmailNotFound(email.to_string()))?;

        Ok(user.into())
    }

    /// All users ordered by id; an empty directory is reported as `EmptyList`
    pub async fn list_users(&self) -> UserResult<Vec<UserResponse>> {
        let users = self.repository.list().await?;
        if users.is_empty() {
            return Err(UserError::EmptyList);
        }

        Ok(users.into_iter().map(Into::into).collect())
    }

    /// Merge the provided fields into the stored user. Publishes nothing.
    pub async fn update_user(&self, id: i64, input: UpdateUser) -> UserResult<UserResponse> {
        let user = self.repository.update(id, input).await?;
        Ok(user.into())
    }

    /// Remove a user and announce `DELETED` with the removed email
    pub async fn delete_user(&self, id: i64) -> UserResult<()> {
        let removed = self
            .repository
            .delete(id)
            .await?
            .ok_or(UserError::NotFound(id))?;

        self.events.announce(UserEvent::deleted(&removed.email)).await;

        Ok(())
    }

    /// Number of stored users
    pub async fn count_users(&self) -> UserResult<u64> {
        self.repository.count().await
    }
}
