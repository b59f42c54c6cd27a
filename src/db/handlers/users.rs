//! Database repository for users.

use crate::types::UserId;
use crate::db::{
    errors::Result,
    handlers::repository::Repository,
    models::users::{UserCreateDBRequest, UserDBResponse, UserUpdateDBRequest},
};
use sqlx::PgConnection;
use tracing::instrument;

/// Filter for listing users
#[derive(Debug, Clone)]
pub struct UserFilter {
    pub skip: i64,
    pub limit: i64,
}

impl UserFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self { skip, limit }
    }
}

pub struct Users<'c> {
    db: &'c mut PgConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for Users<'c> {
    type CreateRequest = UserCreateDBRequest;
    type UpdateRequest = UserUpdateDBRequest;
    type Response = UserDBResponse;
    type Id = UserId;
    type Filter = UserFilter;

    #[instrument(skip(self, request), fields(username = %request.username), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let user = sqlx::query_as::<_, UserDBResponse>(
            r#"
            INSERT INTO users (name, username, password, admin)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, username, password AS password_hash, admin AS is_admin, profile_picture
            "#,
        )
        .bind(&request.name)
        .bind(&request.username)
        .bind(&request.password_hash)
        .bind(request.is_admin)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(user)
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let user = sqlx::query_as::<_, UserDBResponse>(
            "SELECT id, name, username, password AS password_hash, admin AS is_admin, profile_picture FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(user)
    }

    #[instrument(skip(self), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let users = sqlx::query_as::<_, UserDBResponse>(
            r#"
            SELECT id, name, username, password AS password_hash, admin AS is_admin, profile_picture
            FROM users
            ORDER BY id
            OFFSET $1 LIMIT $2
            "#,
        )
        .bind(filter.skip)
        .bind(filter.limit)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(users)
    }

    #[instrument(skip(self), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let user = sqlx::query_as::<_, UserDBResponse>(
            r#"
            UPDATE users
            SET name = COALESCE($2, name),
                username = COALESCE($3, username),
                password = COALESCE($4, password),
                profile_picture = COALESCE($5, profile_picture)
            WHERE id = $1
            RETURNING id, name, username, password AS password_hash, admin AS is_admin, profile_picture
            "#,
        )
        .bind(id)
        .bind(&request.name)
        .bind(&request.username)
        .bind(&request.password_hash)
        .bind(&request.profile_picture)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(user)
    }
}

impl<'c> Users<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self), err)]
    pub async fn get_by_username(&mut self, username: &str) -> Result<Option<UserDBResponse>> {
        let user = sqlx::query_as::<_, UserDBResponse>(
            "SELECT id, name, username, password AS password_hash, admin AS is_admin, profile_picture FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::errors::DbError;
    use sqlx::PgPool;

    fn create_request(username: &str) -> UserCreateDBRequest {
        UserCreateDBRequest {
            name: "Test User".to_string(),
            username: username.to_string(),
            password_hash: "$argon2id$fake".to_string(),
            is_admin: false,
        }
    }

    #[sqlx::test]
    async fn test_create_and_get_user(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Users::new(&mut conn);

        let created = repo.create(&create_request("alice")).await.unwrap();
        assert_eq!(created.username, "alice");
        assert!(!created.is_admin);

        let fetched = repo.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(fetched.username, "alice");

        let by_username = repo.get_by_username("alice").await.unwrap().unwrap();
        assert_eq!(by_username.id, created.id);

        let missing = repo.get_by_username("nobody").await.unwrap();
        assert!(missing.is_none());
    }

    #[sqlx::test]
    async fn test_duplicate_username_is_unique_violation(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Users::new(&mut conn);

        repo.create(&create_request("bob")).await.unwrap();
        let err = repo.create(&create_request("bob")).await.unwrap_err();

        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[sqlx::test]
    async fn test_update_preserves_unset_fields(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Users::new(&mut conn);

        let created = repo.create(&create_request("carol")).await.unwrap();

        let updated = repo
            .update(
                created.id,
                &UserUpdateDBRequest {
                    profile_picture: Some("https://example.com/carol.png".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.username, "carol");
        assert_eq!(updated.name, "Test User");
        assert_eq!(updated.profile_picture.as_deref(), Some("https://example.com/carol.png"));
    }
}
