use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

/// Accepted email shape: local part, `@`, domain, and a TLD of two or more letters
pub static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("email pattern compiles")
});

pub const NAME_MIN_LEN: usize = 3;
pub const NAME_MAX_LEN: usize = 50;

/// Names are measured after trimming; blank names are rejected outright.
fn validate_name(name: &str) -> Result<(), ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::new("blank").with_message("Name must not be blank".into()));
    }

    let len = trimmed.chars().count();
    if !(NAME_MIN_LEN..=NAME_MAX_LEN).contains(&len) {
        return Err(ValidationError::new("name_length").with_message("Name must be 3-50 characters".into()));
    }

    Ok(())
}

/// User record as stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct User {
    /// Store-assigned identifier
    pub id: i64,
    #[validate(regex(path = *EMAIL_REGEX, message = "Invalid email format"))]
    pub email: String,
    #[validate(custom(function = "validate_name"))]
    pub name: String,
    #[validate(range(min = 0, max = 100, message = "Age must be between 0 and 100"))]
    pub age: i32,
    /// Set once at insert
    pub created_at: DateTime<Utc>,
}

/// Validated input for an insert; the store assigns `id` and `created_at`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub age: i32,
}

/// DTO for creating a new user
///
/// Fields are optional at the serde level so that a missing field is reported
/// as a validation message rather than a deserialization failure.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct CreateUser {
    #[schema(example = "user@example.com")]
    #[validate(
        required(message = "Email is required"),
        regex(path = *EMAIL_REGEX, message = "Invalid email format")
    )]
    pub email: Option<String>,

    #[schema(example = "Ada Lovelace")]
    #[validate(required(message = "Name is required"), custom(function = "validate_name"))]
    pub name: Option<String>,

    #[schema(example = 36, minimum = 0, maximum = 100)]
    #[validate(
        required(message = "Age is required"),
        range(min = 0, max = 100, message = "Age must be between 0 and 100")
    )]
    pub age: Option<i32>,
}

impl CreateUser {
    pub fn new(email: impl Into<String>, name: impl Into<String>, age: i32) -> Self {
        Self {
            email: Some(email.into()),
            name: Some(name.into()),
            age: Some(age),
        }
    }

    /// Validate and convert into the insert shape.
    pub fn into_new_user(self) -> Result<NewUser, validator::ValidationErrors> {
        self.validate()?;

        match (self.email, self.name, self.age) {
            (Some(email), Some(name), Some(age)) => Ok(NewUser { email, name, age }),
            // validate() already rejected any missing field
            _ => Err(validator::ValidationErrors::new()),
        }
    }
}

/// DTO for updating a user; only provided fields change
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateUser {
    #[schema(example = "new-email@example.com")]
    #[validate(regex(path = *EMAIL_REGEX, message = "Invalid email format"))]
    pub email: Option<String>,

    #[validate(custom(function = "validate_name"))]
    pub name: Option<String>,

    #[validate(range(min = 0, max = 100, message = "Age must be between 0 and 100"))]
    pub age: Option<i32>,
}

impl User {
    /// Overwrite the fields present in `update`.
    pub fn apply_update(&mut self, update: UpdateUser) {
        if let Some(email) = update.email {
            self.email = email;
        }
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(age) = update.age {
            self.age = age;
        }
    }
}

/// User as returned by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    #[schema(example = 1)]
    pub id: i64,
    pub email: String,
    pub name: String,
    pub age: i32,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            age: user.age,
            created_at: user.created_at,
        }
    }
}

/// Query for `GET /users/findByEmail`
#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EmailQuery {
    /// Email to look up
    pub email: String,
}
