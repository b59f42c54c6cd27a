//! Database repository for events.

use crate::db::{
    errors::Result,
    handlers::repository::Repository,
    models::events::{EventCreateDBRequest, EventDBResponse, EventUpdateDBRequest},
};
use crate::types::EventId;
use sqlx::PgConnection;
use tracing::instrument;

/// Filter for listing events. `limit: None` returns every row.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    pub skip: i64,
    pub limit: Option<i64>,
}

impl EventFilter {
    pub fn new(skip: i64, limit: Option<i64>) -> Self {
        Self { skip, limit }
    }
}

pub struct Events<'c> {
    db: &'c mut PgConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for Events<'c> {
    type CreateRequest = EventCreateDBRequest;
    type UpdateRequest = EventUpdateDBRequest;
    type Response = EventDBResponse;
    type Id = EventId;
    type Filter = EventFilter;

    #[instrument(skip(self, request), fields(slug = %request.slug), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let event = sqlx::query_as::<_, EventDBResponse>(
            r#"
            INSERT INTO events (name, slug, description, location, url)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, slug, description, location, url, created, updated
            "#,
        )
        .bind(&request.name)
        .bind(&request.slug)
        .bind(&request.description)
        .bind(&request.location)
        .bind(&request.url)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(event)
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let event = sqlx::query_as::<_, EventDBResponse>(
            "SELECT id, name, slug, description, location, url, created, updated FROM events WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(event)
    }

    #[instrument(skip(self), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        // A NULL limit is no limit in Postgres
        let events = sqlx::query_as::<_, EventDBResponse>(
            r#"
            SELECT id, name, slug, description, location, url, created, updated
            FROM events
            ORDER BY id
            OFFSET $1 LIMIT $2
            "#,
        )
        .bind(filter.skip)
        .bind(filter.limit)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(events)
    }

    #[instrument(skip(self), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(slug = %request.slug), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let event = sqlx::query_as::<_, EventDBResponse>(
            r#"
            UPDATE events
            SET name = $2,
                slug = $3,
                description = $4,
                location = $5,
                url = $6,
                updated = CURRENT_TIMESTAMP
            WHERE id = $1
            RETURNING id, name, slug, description, location, url, created, updated
            "#,
        )
        .bind(id)
        .bind(&request.name)
        .bind(&request.slug)
        .bind(&request.description)
        .bind(&request.location)
        .bind(&request.url)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(event)
    }
}

impl<'c> Events<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self), err)]
    pub async fn get_by_slug(&mut self, slug: &str) -> Result<Option<EventDBResponse>> {
        let event = sqlx::query_as::<_, EventDBResponse>(
            "SELECT id, name, slug, description, location, url, created, updated FROM events WHERE slug = $1",
        )
        .bind(slug)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(event)
    }

    #[instrument(skip(self), err)]
    pub async fn get_by_name(&mut self, name: &str) -> Result<Option<EventDBResponse>> {
        let event = sqlx::query_as::<_, EventDBResponse>(
            "SELECT id, name, slug, description, location, url, created, updated FROM events WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(event)
    }
}
