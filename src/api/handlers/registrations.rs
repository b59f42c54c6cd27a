use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    api::models::{
        events::EventResponse,
        registrations::{RegistrantResponse, RegistrationRequest, RegistrationResponse, MAX_COMMENT_LENGTH},
        users::CurrentUser,
    },
    auth::current_user::AdminUser,
    db::{
        handlers::{Events, Registrations},
        models::registrations::RegistrationCreateDBRequest,
    },
    errors::Error,
    AppState,
};

/// Register the authenticated user to an event
#[utoipa::path(
    post,
    path = "/events/{slug}",
    tag = "registrations",
    params(("slug" = String, Path, description = "Event slug")),
    request_body = RegistrationRequest,
    responses(
        (status = 200, description = "Registered", body = RegistrationResponse),
        (status = 400, description = "Comment too long"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Event not found"),
        (status = 409, description = "Already registered"),
    ),
    security(("bearer" = []))
)]
#[tracing::instrument(skip_all, fields(slug = %slug, user_id = user.id))]
pub async fn register(
    user: CurrentUser,
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Json(request): Json<RegistrationRequest>,
) -> Result<Json<RegistrationResponse>, Error> {
    // Sanitize the comment before it is stored: cap the length, escape HTML
    // and strip surrounding whitespace
    let comment = match request.comment {
        Some(raw) => {
            if raw.chars().count() > MAX_COMMENT_LENGTH {
                return Err(Error::BadRequest {
                    message: format!("Comment must be no more than {MAX_COMMENT_LENGTH} characters"),
                });
            }
            Some(html_escape::encode_text(raw.trim()).into_owned())
        }
        None => None,
    };

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let event = Events::new(&mut conn).get_by_slug(&slug).await?.ok_or_else(|| Error::NotFound {
        resource: "Event".to_string(),
        id: slug.clone(),
    })?;

    let mut registration_repo = Registrations::new(&mut conn);
    if registration_repo.find_for_user_and_event(user.id, event.id).await?.is_some() {
        return Err(Error::Conflict {
            message: "You are already registered to this event".to_string(),
        });
    }

    let registration = registration_repo
        .create(&RegistrationCreateDBRequest {
            comment,
            event: event.id,
            user_id: user.id,
        })
        .await?;

    Ok(Json(RegistrationResponse::from(registration)))
}

/// Remove the authenticated user's registration to an event
#[utoipa::path(
    delete,
    path = "/events/{slug}",
    tag = "registrations",
    params(("slug" = String, Path, description = "Event slug")),
    responses(
        (status = 200, description = "Unregistered"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Event not found"),
        (status = 500, description = "No registration to remove"),
    ),
    security(("bearer" = []))
)]
#[tracing::instrument(skip_all, fields(slug = %slug, user_id = user.id))]
pub async fn unregister(
    user: CurrentUser,
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<serde_json::Value>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let event = Events::new(&mut conn).get_by_slug(&slug).await?.ok_or_else(|| Error::NotFound {
        resource: "Event".to_string(),
        id: slug.clone(),
    })?;

    let removed = Registrations::new(&mut conn).delete_for_user_and_event(user.id, event.id).await?;
    if removed == 0 {
        return Err(Error::Internal {
            operation: format!("unregister from event {slug}"),
        });
    }

    Ok(Json(serde_json::json!({ "message": "Unregistered" })))
}

/// List everyone registered to an event
#[utoipa::path(
    get,
    path = "/admin/{slug}/register",
    tag = "admin",
    params(("slug" = String, Path, description = "Event slug")),
    responses(
        (status = 200, description = "Registrants", body = Vec<RegistrantResponse>),
        (status = 404, description = "Event not found"),
    ),
    security(("bearer" = []))
)]
#[tracing::instrument(skip_all, fields(slug = %slug))]
pub async fn list_registrants(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Vec<RegistrantResponse>>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let event = Events::new(&mut conn).get_by_slug(&slug).await?.ok_or_else(|| Error::NotFound {
        resource: "Event".to_string(),
        id: slug.clone(),
    })?;

    let registrants = Registrations::new(&mut conn).list_registrants(event.id).await?;

    Ok(Json(registrants.into_iter().map(RegistrantResponse::from).collect()))
}

/// List the events the authenticated user is registered to
#[utoipa::path(
    get,
    path = "/users/me/events",
    tag = "users",
    responses(
        (status = 200, description = "Registered events", body = Vec<EventResponse>),
        (status = 401, description = "Not authenticated"),
    ),
    security(("bearer" = []))
)]
#[tracing::instrument(skip_all, fields(user_id = user.id))]
pub async fn my_events(user: CurrentUser, State(state): State<AppState>) -> Result<Json<Vec<EventResponse>>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let events = Registrations::new(&mut conn).list_events_for_user(user.id).await?;

    Ok(Json(events.into_iter().map(EventResponse::from).collect()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::handlers::Repository;
    use crate::db::models::events::EventCreateDBRequest;
    use crate::test_utils::{auth_header, create_test_config, create_test_user};
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use sqlx::PgPool;

    fn registration_router(pool: PgPool) -> TestServer {
        let state = AppState::builder().db(pool).config(create_test_config()).build();
        let app = axum::Router::new()
            .route("/events/{slug}", axum::routing::post(register).delete(unregister))
            .route("/admin/{slug}/register", axum::routing::get(list_registrants))
            .route("/users/me/events", axum::routing::get(my_events))
            .with_state(state);

        TestServer::new(app).unwrap()
    }

    async fn seed_event(pool: &PgPool, name: &str, slug: &str) {
        let mut conn = pool.acquire().await.unwrap();
        Events::new(&mut conn)
            .create(&EventCreateDBRequest {
                name: name.to_string(),
                slug: slug.to_string(),
                description: None,
                location: None,
                url: None,
            })
            .await
            .unwrap();
    }

    #[sqlx::test]
    async fn test_register_with_comment(pool: PgPool) {
        let server = registration_router(pool.clone());
        let user = create_test_user(&pool, "attendee", "user-password-12", false).await;
        seed_event(&pool, "Meetup", "meetup").await;

        let response = server
            .post("/events/meetup")
            .add_header("authorization", auth_header(&user))
            .json(&RegistrationRequest {
                comment: Some("  see you <there>  ".to_string()),
            })
            .await;
        response.assert_status_ok();

        let body: RegistrationResponse = response.json();
        assert_eq!(body.user_id, user.id);
        // Whitespace trimmed and HTML escaped
        assert_eq!(body.comment.as_deref(), Some("see you &lt;there&gt;"));
    }

    #[sqlx::test]
    async fn test_register_twice_conflicts(pool: PgPool) {
        let server = registration_router(pool.clone());
        let user = create_test_user(&pool, "attendee", "user-password-12", false).await;
        seed_event(&pool, "Meetup", "meetup").await;

        let first = server
            .post("/events/meetup")
            .add_header("authorization", auth_header(&user))
            .json(&RegistrationRequest::default())
            .await;
        first.assert_status_ok();

        let second = server
            .post("/events/meetup")
            .add_header("authorization", auth_header(&user))
            .json(&RegistrationRequest::default())
            .await;
        second.assert_status(StatusCode::CONFLICT);
    }

    #[sqlx::test]
    async fn test_register_long_comment_is_rejected(pool: PgPool) {
        let server = registration_router(pool.clone());
        let user = create_test_user(&pool, "attendee", "user-password-12", false).await;
        seed_event(&pool, "Meetup", "meetup").await;

        let response = server
            .post("/events/meetup")
            .add_header("authorization", auth_header(&user))
            .json(&RegistrationRequest {
                comment: Some("x".repeat(MAX_COMMENT_LENGTH + 1)),
            })
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[sqlx::test]
    async fn test_register_to_unknown_event_is_404(pool: PgPool) {
        let server = registration_router(pool.clone());
        let user = create_test_user(&pool, "attendee", "user-password-12", false).await;

        let response = server
            .post("/events/missing")
            .add_header("authorization", auth_header(&user))
            .json(&RegistrationRequest::default())
            .await;
        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[sqlx::test]
    async fn test_register_requires_authentication(pool: PgPool) {
        let server = registration_router(pool.clone());
        seed_event(&pool, "Meetup", "meetup").await;

        let response = server.post("/events/meetup").json(&RegistrationRequest::default()).await;
        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[sqlx::test]
    async fn test_unregister(pool: PgPool) {
        let server = registration_router(pool.clone());
        let user = create_test_user(&pool, "attendee", "user-password-12", false).await;
        seed_event(&pool, "Meetup", "meetup").await;

        server
            .post("/events/meetup")
            .add_header("authorization", auth_header(&user))
            .json(&RegistrationRequest::default())
            .await
            .assert_status_ok();

        let response = server
            .delete("/events/meetup")
            .add_header("authorization", auth_header(&user))
            .await;
        response.assert_status_ok();

        // A second unregister has nothing to remove
        let again = server
            .delete("/events/meetup")
            .add_header("authorization", auth_header(&user))
            .await;
        again.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[sqlx::test]
    async fn test_list_registrants(pool: PgPool) {
        let server = registration_router(pool.clone());
        let admin = create_test_user(&pool, "admin", "admin-password-1", true).await;
        let user = create_test_user(&pool, "attendee", "user-password-12", false).await;
        seed_event(&pool, "Meetup", "meetup").await;

        server
            .post("/events/meetup")
            .add_header("authorization", auth_header(&user))
            .json(&RegistrationRequest {
                comment: Some("hi".to_string()),
            })
            .await
            .assert_status_ok();

        let response = server
            .get("/admin/meetup/register")
            .add_header("authorization", auth_header(&admin))
            .await;
        response.assert_status_ok();

        let body: Vec<RegistrantResponse> = response.json();
        assert_eq!(body.len(), 1);
        assert_eq!(body[0].username, "attendee");
        assert_eq!(body[0].comment.as_deref(), Some("hi"));
    }

    #[sqlx::test]
    async fn test_list_registrants_unknown_event_is_404(pool: PgPool) {
        let server = registration_router(pool.clone());
        let admin = create_test_user(&pool, "admin", "admin-password-1", true).await;

        let response = server
            .get("/admin/missing/register")
            .add_header("authorization", auth_header(&admin))
            .await;
        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[sqlx::test]
    async fn test_my_events(pool: PgPool) {
        let server = registration_router(pool.clone());
        let user = create_test_user(&pool, "attendee", "user-password-12", false).await;
        seed_event(&pool, "First", "first").await;
        seed_event(&pool, "Second", "second").await;

        server
            .post("/events/first")
            .add_header("authorization", auth_header(&user))
            .json(&RegistrationRequest::default())
            .await
            .assert_status_ok();

        let response = server.get("/users/me/events").add_header("authorization", auth_header(&user)).await;
        response.assert_status_ok();

        let body: Vec<EventResponse> = response.json();
        assert_eq!(body.len(), 1);
        assert_eq!(body[0].slug, "first");
    }
}
