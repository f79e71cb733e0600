use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::auth::repo_types::User;

/// Request body for user registration.
#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    // absent and `null` both mean empty
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
}

/// Request body for login.
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Public part of the user returned to the client. Has no password field.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: i32,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub bio: String,
    #[serde(with = "time::serde::rfc3339::option")]
    pub created_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            first_name: user.first_name.unwrap_or_default(),
            last_name: user.last_name.unwrap_or_default(),
            bio: user.bio.unwrap_or_default(),
            // TIMESTAMP columns carry no offset; read them as UTC
            created_at: user.created_at.map(|t| t.assume_utc()),
            updated_at: user.updated_at.map(|t| t.assume_utc()),
        }
    }
}
