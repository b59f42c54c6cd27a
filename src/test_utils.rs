//! Shared helpers for tests.

use sqlx::PgPool;

use crate::{
    api::models::users::CurrentUser,
    auth::{password, session},
    config::Config,
    db::{
        handlers::{Repository, Users},
        models::users::{UserCreateDBRequest, UserDBResponse},
    },
};

/// A configuration suitable for tests: fixed secret, no Secure cookies.
pub fn create_test_config() -> Config {
    let mut config = Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        secret_key: Some("test-secret-key-for-testing-only".to_string()),
        ..Default::default()
    };
    config.auth.session.cookie_secure = false;
    // Cheap argon2 parameters so tests stay fast
    config.auth.password.argon2_memory_kib = 1024;
    config.auth.password.argon2_iterations = 1;
    config
}

/// Insert a user with a real password hash.
pub async fn create_test_user(pool: &PgPool, username: &str, password: &str, is_admin: bool) -> UserDBResponse {
    let params = password::Argon2Params {
        memory_kib: 1024,
        iterations: 1,
        parallelism: 1,
    };
    let password_hash = password::hash_string_with_params(password, Some(params)).expect("hashing should succeed");

    let mut conn = pool.acquire().await.expect("pool should provide a connection");
    Users::new(&mut conn)
        .create(&UserCreateDBRequest {
            name: format!("Test user {username}"),
            username: username.to_string(),
            password_hash,
            is_admin,
        })
        .await
        .expect("user creation should succeed")
}

/// An `Authorization` header value carrying a bearer token for the user,
/// signed with the [`create_test_config`] secret.
pub fn auth_header(user: &UserDBResponse) -> String {
    let current_user = CurrentUser::from(user.clone());
    let token = session::create_session_token(&current_user, &create_test_config()).expect("token creation should succeed");
    format!("Bearer {token}")
}
