//! Database models for users.

use crate::types::UserId;

/// Database request for creating a new user
#[derive(Debug, Clone)]
pub struct UserCreateDBRequest {
    pub name: String,
    pub username: String,
    pub password_hash: String,
    pub is_admin: bool,
}

/// Database request for updating a user
///
/// Fields set to `None` are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct UserUpdateDBRequest {
    pub name: Option<String>,
    pub username: Option<String>,
    pub password_hash: Option<String>,
    pub profile_picture: Option<String>,
}

/// Database response for a user
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserDBResponse {
    pub id: UserId,
    pub name: String,
    pub username: String,
    pub password_hash: String,
    pub is_admin: bool,
    pub profile_picture: Option<String>,
}
