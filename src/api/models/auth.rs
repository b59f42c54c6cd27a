//! API request/response models for authentication.

use crate::api::models::users::UserResponse;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Request body for logging in
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Access token payload returned on a successful login
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    pub user: UserResponse,
    pub access_token: String,
    /// Always "Bearer"
    pub token_type: String,
    /// Token lifetime in seconds
    pub expires_in: u64,
}

/// Login response: token body plus the session cookie
#[derive(Debug)]
pub struct LoginResponse {
    pub token: TokenResponse,
    pub cookie: String,
}

impl IntoResponse for LoginResponse {
    fn into_response(self) -> Response {
        ([(axum::http::header::SET_COOKIE, self.cookie)], axum::Json(self.token)).into_response()
    }
}

/// Generic message payload for auth endpoints
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthSuccessResponse {
    pub message: String,
}

/// Logout response: message body plus a cookie that clears the session
#[derive(Debug)]
pub struct LogoutResponse {
    pub message: AuthSuccessResponse,
    pub cookie: String,
}

impl IntoResponse for LogoutResponse {
    fn into_response(self) -> Response {
        ([(axum::http::header::SET_COOKIE, self.cookie)], axum::Json(self.message)).into_response()
    }
}
