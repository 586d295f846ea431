use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Role of an account. Corresponds to the `user_role` SQL enum.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    User,
    Admin,
}

/// A registered account as stored in the `users` table.
///
/// The password hash is never serialised into API responses.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    /// Avatar image URL. Starts out as the Gravatar URL of the e-mail address.
    pub avatar: Option<String>,
    /// Whether the e-mail address has been confirmed. Login is refused until it is.
    pub confirmed: bool,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

/// Everything needed to insert a new row into `users`.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub avatar: Option<String>,
    pub role: UserRole,
}

/// Gravatar URL for an e-mail address (MD5 of the trimmed, lower-cased address).
pub fn gravatar_url(email: &str) -> String {
    let digest = md5::compute(email.trim().to_lowercase());
    format!("https://www.gravatar.com/avatar/{:x}", digest)
}
