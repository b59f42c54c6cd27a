//! API request/response models for users.

use crate::db::models::users::UserDBResponse;
use crate::types::UserId;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Request body for creating an account
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SignupRequest {
    pub name: String,
    pub username: String,
    pub password: String,
}

/// Request body for updating the authenticated user's profile
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProfileUpdateRequest {
    pub name: Option<String>,
    pub username: Option<String>,
}

/// User representation returned to API clients. Never carries the password hash.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: UserId,
    pub name: String,
    pub username: String,
    pub is_admin: bool,
    pub profile_picture: Option<String>,
}

impl From<UserDBResponse> for UserResponse {
    fn from(db: UserDBResponse) -> Self {
        Self {
            id: db.id,
            name: db.name,
            username: db.username,
            is_admin: db.is_admin,
            profile_picture: db.profile_picture,
        }
    }
}

/// The authenticated principal attached to a request.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CurrentUser {
    pub id: UserId,
    pub username: String,
    pub is_admin: bool,
}

impl From<UserDBResponse> for CurrentUser {
    fn from(db: UserDBResponse) -> Self {
        Self {
            id: db.id,
            username: db.username,
            is_admin: db.is_admin,
        }
    }
}
