use axum::{extract::State, Json};

use crate::{
    api::models::{
        auth::{AuthSuccessResponse, LoginRequest, LoginResponse, LogoutResponse, TokenResponse},
        users::{CurrentUser, SignupRequest, UserResponse},
    },
    auth::{password, session},
    db::{
        handlers::{Repository, Users},
        models::users::UserCreateDBRequest,
    },
    errors::Error,
    AppState,
};

/// Validate a name or username field: non-empty, at most 64 characters.
fn validate_name_field(value: &str, field: &str) -> Result<(), Error> {
    if value.is_empty() || value.chars().count() > 64 {
        return Err(Error::BadRequest {
            message: format!("{field} must be between 1 and 64 characters"),
        });
    }
    Ok(())
}

/// Create a new user account
#[utoipa::path(
    post,
    path = "/signup",
    request_body = SignupRequest,
    tag = "authentication",
    responses(
        (status = 200, description = "Account created", body = UserResponse),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Username already taken"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn signup(State(state): State<AppState>, Json(request): Json<SignupRequest>) -> Result<Json<UserResponse>, Error> {
    validate_name_field(&request.name, "name")?;
    validate_name_field(&request.username, "username")?;

    // Validate password length
    let password_config = &state.config.auth.password;
    if request.password.len() < password_config.min_length {
        return Err(Error::BadRequest {
            message: format!("Password must be at least {} characters", password_config.min_length),
        });
    }
    if request.password.len() > password_config.max_length {
        return Err(Error::BadRequest {
            message: format!("Password must be no more than {} characters", password_config.max_length),
        });
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut user_repo = Users::new(&mut conn);

    // Check if the username is already taken
    if user_repo.get_by_username(&request.username).await?.is_some() {
        return Err(Error::Conflict {
            message: "This username is already taken".to_string(),
        });
    }

    // Hash the password on a blocking thread to avoid blocking async runtime
    let params = password::Argon2Params {
        memory_kib: password_config.argon2_memory_kib,
        iterations: password_config.argon2_iterations,
        parallelism: password_config.argon2_parallelism,
    };
    let password = request.password.clone();
    let password_hash = tokio::task::spawn_blocking(move || password::hash_string_with_params(&password, Some(params)))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("spawn password hashing task: {e}"),
        })??;

    let create_request = UserCreateDBRequest {
        name: request.name,
        username: request.username,
        password_hash,
        is_admin: false,
    };

    let created_user = user_repo.create(&create_request).await?;

    Ok(Json(UserResponse::from(created_user)))
}

/// Login with username and password
#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    tag = "authentication",
    responses(
        (status = 200, description = "Login successful", body = TokenResponse),
        (status = 401, description = "Invalid credentials"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn login(State(state): State<AppState>, Json(request): Json<LoginRequest>) -> Result<LoginResponse, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut user_repo = Users::new(&mut conn);

    // Find user by username
    let user = user_repo
        .get_by_username(&request.username)
        .await?
        .ok_or_else(|| Error::Unauthenticated {
            message: Some("Invalid username or password".to_string()),
        })?;

    // Verify password on a blocking thread to avoid blocking async runtime
    let password = request.password.clone();
    let hash = user.password_hash.clone();
    let is_valid = tokio::task::spawn_blocking(move || password::verify_string(&password, &hash))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("spawn password verification task: {e}"),
        })??;

    if !is_valid {
        return Err(Error::Unauthenticated {
            message: Some("Invalid username or password".to_string()),
        });
    }

    let current_user = CurrentUser::from(user.clone());
    let token = session::create_session_token(&current_user, &state.config)?;
    let cookie = create_session_cookie(&token, &state.config);

    Ok(LoginResponse {
        token: TokenResponse {
            user: UserResponse::from(user),
            access_token: token,
            token_type: "Bearer".to_string(),
            expires_in: state.config.auth.security.jwt_expiry.as_secs(),
        },
        cookie,
    })
}

/// Logout (clear session)
#[utoipa::path(
    get,
    path = "/logout",
    tag = "authentication",
    responses(
        (status = 200, description = "Logout successful", body = AuthSuccessResponse),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn logout(State(state): State<AppState>) -> Result<LogoutResponse, Error> {
    // Create expired cookie to clear session
    let session_config = &state.config.auth.session;
    let cookie = format!(
        "{}=; Path=/; HttpOnly; Secure={}; SameSite={}; Max-Age=0",
        session_config.cookie_name, session_config.cookie_secure, session_config.cookie_same_site
    );

    Ok(LogoutResponse {
        message: AuthSuccessResponse {
            message: "Logout successful".to_string(),
        },
        cookie,
    })
}

/// Helper function to create a session cookie
fn create_session_cookie(token: &str, config: &crate::config::Config) -> String {
    let session_config = &config.auth.session;
    let max_age = config.auth.security.jwt_expiry.as_secs();

    format!(
        "{}={}; Path=/; HttpOnly; Secure={}; SameSite={}; Max-Age={}",
        session_config.cookie_name, token, session_config.cookie_secure, session_config.cookie_same_site, max_age
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{create_test_config, create_test_user};
    use axum_test::TestServer;
    use sqlx::PgPool;

    fn auth_router(pool: PgPool) -> TestServer {
        let state = AppState::builder().db(pool).config(create_test_config()).build();
        let app = axum::Router::new()
            .route("/signup", axum::routing::post(signup))
            .route("/login", axum::routing::post(login))
            .route("/logout", axum::routing::get(logout))
            .with_state(state);

        TestServer::new(app).unwrap()
    }

    #[sqlx::test]
    async fn test_signup_success(pool: PgPool) {
        let server = auth_router(pool);

        let request = SignupRequest {
            name: "Test User".to_string(),
            username: "testuser".to_string(),
            password: "long-enough-password".to_string(),
        };

        let response = server.post("/signup").json(&request).await;
        response.assert_status_ok();

        let body: UserResponse = response.json();
        assert_eq!(body.username, "testuser");
        assert!(!body.is_admin);
    }

    #[sqlx::test]
    async fn test_signup_short_password(pool: PgPool) {
        let server = auth_router(pool);

        let request = SignupRequest {
            name: "Test User".to_string(),
            username: "testuser".to_string(),
            password: "short".to_string(),
        };

        let response = server.post("/signup").json(&request).await;
        response.assert_status(axum::http::StatusCode::BAD_REQUEST);
    }

    #[sqlx::test]
    async fn test_signup_empty_name(pool: PgPool) {
        let server = auth_router(pool);

        let request = SignupRequest {
            name: "".to_string(),
            username: "testuser".to_string(),
            password: "long-enough-password".to_string(),
        };

        let response = server.post("/signup").json(&request).await;
        response.assert_status(axum::http::StatusCode::BAD_REQUEST);
    }

    #[sqlx::test]
    async fn test_signup_duplicate_username(pool: PgPool) {
        let server = auth_router(pool.clone());
        create_test_user(&pool, "taken", "some-password-123", false).await;

        let request = SignupRequest {
            name: "Someone Else".to_string(),
            username: "taken".to_string(),
            password: "long-enough-password".to_string(),
        };

        let response = server.post("/signup").json(&request).await;
        response.assert_status(axum::http::StatusCode::CONFLICT);
    }

    #[sqlx::test]
    async fn test_login_success(pool: PgPool) {
        let server = auth_router(pool.clone());
        create_test_user(&pool, "logme", "correct-horse-battery", false).await;

        let request = LoginRequest {
            username: "logme".to_string(),
            password: "correct-horse-battery".to_string(),
        };

        let response = server.post("/login").json(&request).await;
        response.assert_status_ok();
        assert!(response.headers().get("set-cookie").is_some());

        let body: TokenResponse = response.json();
        assert_eq!(body.token_type, "Bearer");
        assert!(!body.access_token.is_empty());
        assert!(body.expires_in > 0);
        assert_eq!(body.user.username, "logme");
    }

    #[sqlx::test]
    async fn test_login_wrong_password(pool: PgPool) {
        let server = auth_router(pool.clone());
        create_test_user(&pool, "logme", "correct-horse-battery", false).await;

        let request = LoginRequest {
            username: "logme".to_string(),
            password: "wrong-password-entirely".to_string(),
        };

        let response = server.post("/login").json(&request).await;
        response.assert_status(axum::http::StatusCode::UNAUTHORIZED);
    }

    #[sqlx::test]
    async fn test_login_unknown_user(pool: PgPool) {
        let server = auth_router(pool);

        let request = LoginRequest {
            username: "ghost".to_string(),
            password: "does-not-matter-at-all".to_string(),
        };

        let response = server.post("/login").json(&request).await;
        response.assert_status(axum::http::StatusCode::UNAUTHORIZED);
    }

    #[sqlx::test]
    async fn test_logout_clears_cookie(pool: PgPool) {
        let server = auth_router(pool);

        let response = server.get("/logout").await;
        response.assert_status_ok();

        let cookie = response.headers().get("set-cookie").unwrap().to_str().unwrap();
        assert!(cookie.contains("Max-Age=0"));
    }
}
