//! Database repository for event registrations.

use crate::db::{
    errors::Result,
    models::registrations::{RegistrantDBResponse, RegistrationCreateDBRequest, RegistrationDBResponse},
};
use crate::types::{EventId, UserId};
use sqlx::PgConnection;
use tracing::instrument;

pub struct Registrations<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Registrations<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request), fields(event = request.event, user_id = request.user_id), err)]
    pub async fn create(&mut self, request: &RegistrationCreateDBRequest) -> Result<RegistrationDBResponse> {
        let registration = sqlx::query_as::<_, RegistrationDBResponse>(
            r#"
            INSERT INTO registrations (comment, event, user_id)
            VALUES ($1, $2, $3)
            RETURNING id, comment, event, user_id, created
            "#,
        )
        .bind(&request.comment)
        .bind(request.event)
        .bind(request.user_id)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(registration)
    }

    /// Look up the registration for a (user, event) pair, if any.
    #[instrument(skip(self), err)]
    pub async fn find_for_user_and_event(&mut self, user_id: UserId, event: EventId) -> Result<Option<RegistrationDBResponse>> {
        let registration = sqlx::query_as::<_, RegistrationDBResponse>(
            "SELECT id, comment, event, user_id, created FROM registrations WHERE user_id = $1 AND event = $2",
        )
        .bind(user_id)
        .bind(event)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(registration)
    }

    /// Remove the registration for a (user, event) pair, returning the number of rows removed.
    #[instrument(skip(self), err)]
    pub async fn delete_for_user_and_event(&mut self, user_id: UserId, event: EventId) -> Result<u64> {
        let result = sqlx::query("DELETE FROM registrations WHERE user_id = $1 AND event = $2")
            .bind(user_id)
            .bind(event)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected())
    }

    /// Remove every registration for an event. Used by the transactional event delete.
    #[instrument(skip(self), err)]
    pub async fn delete_for_event(&mut self, event: EventId) -> Result<u64> {
        let result = sqlx::query("DELETE FROM registrations WHERE event = $1")
            .bind(event)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected())
    }

    /// List registrations for an event joined with the registered users.
    #[instrument(skip(self), err)]
    pub async fn list_registrants(&mut self, event: EventId) -> Result<Vec<RegistrantDBResponse>> {
        let registrants = sqlx::query_as::<_, RegistrantDBResponse>(
            r#"
            SELECT r.id, r.user_id, u.name, u.username, r.comment, r.created
            FROM registrations r
            INNER JOIN users u ON r.user_id = u.id
            WHERE r.event = $1
            ORDER BY r.created
            "#,
        )
        .bind(event)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(registrants)
    }

    /// List events a user is registered to.
    #[instrument(skip(self), err)]
    pub async fn list_events_for_user(&mut self, user_id: UserId) -> Result<Vec<crate::db::models::events::EventDBResponse>> {
        let events = sqlx::query_as::<_, crate::db::models::events::EventDBResponse>(
            r#"
            SELECT e.id, e.name, e.slug, e.description, e.location, e.url, e.created, e.updated
            FROM events e
            INNER JOIN registrations r ON r.event = e.id
            WHERE r.user_id = $1
            ORDER BY e.created
            "#,
        )
        .bind(user_id)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::handlers::{Events, Repository, Users};
    use crate::db::models::events::EventCreateDBRequest;
    use crate::db::models::users::UserCreateDBRequest;
    use sqlx::PgPool;

    async fn seed_user_and_event(pool: &PgPool) -> (UserId, EventId) {
        let mut conn = pool.acquire().await.unwrap();

        let user = Users::new(&mut conn)
            .create(&UserCreateDBRequest {
                name: "Test User".to_string(),
                username: "registrant".to_string(),
                password_hash: "$argon2id$fake".to_string(),
                is_admin: false,
            })
            .await
            .unwrap();

        let event = Events::new(&mut conn)
            .create(&EventCreateDBRequest {
                name: "Meetup".to_string(),
                slug: "meetup".to_string(),
                description: None,
                location: None,
                url: None,
            })
            .await
            .unwrap();

        (user.id, event.id)
    }

    #[sqlx::test]
    async fn test_register_and_find(pool: PgPool) {
        let (user_id, event_id) = seed_user_and_event(&pool).await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Registrations::new(&mut conn);

        assert!(repo.find_for_user_and_event(user_id, event_id).await.unwrap().is_none());

        let created = repo
            .create(&RegistrationCreateDBRequest {
                comment: Some("looking forward to it".to_string()),
                event: event_id,
                user_id,
            })
            .await
            .unwrap();

        let found = repo.find_for_user_and_event(user_id, event_id).await.unwrap().unwrap();
        assert_eq!(found.id, created.id);
        assert_eq!(found.comment.as_deref(), Some("looking forward to it"));
    }

    #[sqlx::test]
    async fn test_unregister_removes_only_matching_row(pool: PgPool) {
        let (user_id, event_id) = seed_user_and_event(&pool).await;
        let mut conn = pool.acquire().await.unwrap();

        let other_user = Users::new(&mut conn)
            .create(&UserCreateDBRequest {
                name: "Other".to_string(),
                username: "other".to_string(),
                password_hash: "$argon2id$fake".to_string(),
                is_admin: false,
            })
            .await
            .unwrap();

        let mut repo = Registrations::new(&mut conn);
        for uid in [user_id, other_user.id] {
            repo.create(&RegistrationCreateDBRequest {
                comment: None,
                event: event_id,
                user_id: uid,
            })
            .await
            .unwrap();
        }

        let removed = repo.delete_for_user_and_event(user_id, event_id).await.unwrap();
        assert_eq!(removed, 1);

        let registrants = repo.list_registrants(event_id).await.unwrap();
        assert_eq!(registrants.len(), 1);
        assert_eq!(registrants[0].username, "other");
    }

    #[sqlx::test]
    async fn test_list_events_for_user(pool: PgPool) {
        let (user_id, event_id) = seed_user_and_event(&pool).await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Registrations::new(&mut conn);

        repo.create(&RegistrationCreateDBRequest {
            comment: None,
            event: event_id,
            user_id,
        })
        .await
        .unwrap();

        let events = repo.list_events_for_user(user_id).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].slug, "meetup");
    }
}
