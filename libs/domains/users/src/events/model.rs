use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Title of the event published after a user is inserted
pub const CREATED: &str = "CREATED";
/// Title of the event published after a user is removed
pub const DELETED: &str = "DELETED";

/// Wire payload of a user change event, keyed by `email` on the stream.
///
/// ```json
/// { "title": "CREATED", "email": "ada@example.com" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserEvent {
    pub title: String,
    pub email: String,
}

impl UserEvent {
    pub fn new(title: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            email: email.into(),
        }
    }

    pub fn created(email: impl Into<String>) -> Self {
        Self::new(CREATED, email)
    }

    pub fn deleted(email: impl Into<String>) -> Self {
        Self::new(DELETED, email)
    }
}

/// An event that could not be delivered and waits for redelivery.
///
/// `created_at` is fixed at construction; `retry_count` only grows and
/// `processed` flips to true once.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingEvent {
    /// `None` until the store has assigned one
    pub id: Option<i64>,
    pub title: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub retry_count: i32,
    pub processed: bool,
}

impl PendingEvent {
    pub fn new(event: &UserEvent) -> Self {
        Self {
            id: None,
            title: event.title.clone(),
            email: event.email.clone(),
            created_at: Utc::now(),
            retry_count: 0,
            processed: false,
        }
    }

    /// The payload to republish.
    pub fn to_event(&self) -> UserEvent {
        UserEvent::new(self.title.clone(), self.email.clone())
    }
}
