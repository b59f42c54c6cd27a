use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    api::models::events::{slugify, EventCreate, EventListQuery, EventResponse, EventUpdate},
    auth::current_user::AdminUser,
    db::{
        handlers::{events::EventFilter, Events, Registrations, Repository},
        models::events::{EventCreateDBRequest, EventUpdateDBRequest},
    },
    errors::Error,
    AppState,
};

/// List all events
#[utoipa::path(
    get,
    path = "/events",
    tag = "events",
    params(EventListQuery),
    responses(
        (status = 200, description = "All events", body = Vec<EventResponse>),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_events(State(state): State<AppState>, Query(query): Query<EventListQuery>) -> Result<Json<Vec<EventResponse>>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let filter = EventFilter::new(query.skip.unwrap_or(0), query.limit);
    let events = Events::new(&mut conn).list(&filter).await?;

    Ok(Json(events.into_iter().map(EventResponse::from).collect()))
}

/// Get a single event by slug
#[utoipa::path(
    get,
    path = "/events/{slug}",
    tag = "events",
    params(("slug" = String, Path, description = "Event slug")),
    responses(
        (status = 200, description = "The event", body = EventResponse),
        (status = 404, description = "Event not found"),
    )
)]
#[tracing::instrument(skip_all, fields(slug = %slug))]
pub async fn get_event(State(state): State<AppState>, Path(slug): Path<String>) -> Result<Json<EventResponse>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let event = Events::new(&mut conn).get_by_slug(&slug).await?.ok_or_else(|| Error::NotFound {
        resource: "Event".to_string(),
        id: slug.clone(),
    })?;

    Ok(Json(EventResponse::from(event)))
}

/// List all events (admin view)
#[utoipa::path(
    get,
    path = "/admin",
    tag = "admin",
    params(EventListQuery),
    responses(
        (status = 200, description = "All events", body = Vec<EventResponse>),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not an admin"),
    ),
    security(("bearer" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn admin_list_events(
    _admin: AdminUser,
    State(state): State<AppState>,
    Query(query): Query<EventListQuery>,
) -> Result<Json<Vec<EventResponse>>, Error> {
    list_events(State(state), Query(query)).await
}

/// Get a single event by slug (admin view)
#[utoipa::path(
    get,
    path = "/admin/{slug}",
    tag = "admin",
    params(("slug" = String, Path, description = "Event slug")),
    responses(
        (status = 200, description = "The event", body = EventResponse),
        (status = 404, description = "Event not found"),
    ),
    security(("bearer" = []))
)]
#[tracing::instrument(skip_all, fields(slug = %slug))]
pub async fn admin_get_event(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<EventResponse>, Error> {
    get_event(State(state), Path(slug)).await
}

/// Create a new event
#[utoipa::path(
    post,
    path = "/admin/{slug}",
    tag = "admin",
    request_body = EventCreate,
    responses(
        (status = 201, description = "Event created", body = EventResponse),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "An event with this slug already exists"),
    ),
    security(("bearer" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_event(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(_slug): Path<String>,
    Json(request): Json<EventCreate>,
) -> Result<(StatusCode, Json<EventResponse>), Error> {
    if request.name.is_empty() || request.name.chars().count() > 64 {
        return Err(Error::BadRequest {
            message: "name must be between 1 and 64 characters".to_string(),
        });
    }

    // The slug is always derived from the name, not taken from the client
    let slug = slugify(&request.name);
    if slug.is_empty() {
        return Err(Error::BadRequest {
            message: "name must contain at least one alphanumeric character".to_string(),
        });
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut event_repo = Events::new(&mut conn);

    if event_repo.get_by_slug(&slug).await?.is_some() {
        return Err(Error::Conflict {
            message: "An event with this slug already exists".to_string(),
        });
    }

    let created = event_repo
        .create(&EventCreateDBRequest {
            name: request.name,
            slug,
            description: request.description,
            location: request.location,
            url: request.url,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(EventResponse::from(created))))
}

/// Update an existing event
#[utoipa::path(
    patch,
    path = "/admin/{slug}",
    tag = "admin",
    params(("slug" = String, Path, description = "Event slug")),
    request_body = EventUpdate,
    responses(
        (status = 200, description = "Event updated", body = EventResponse),
        (status = 400, description = "Invalid input"),
        (status = 404, description = "Event not found"),
        (status = 409, description = "The new name belongs to a different event"),
    ),
    security(("bearer" = []))
)]
#[tracing::instrument(skip_all, fields(slug = %slug))]
pub async fn update_event(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Json(request): Json<EventUpdate>,
) -> Result<Json<EventResponse>, Error> {
    if request.name.is_empty() || request.name.chars().count() > 64 {
        return Err(Error::BadRequest {
            message: "name must be between 1 and 64 characters".to_string(),
        });
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut event_repo = Events::new(&mut conn);

    let existing = event_repo.get_by_slug(&slug).await?.ok_or_else(|| Error::NotFound {
        resource: "Event".to_string(),
        id: slug.clone(),
    })?;

    // Renaming onto a name held by another event would make its slug ambiguous
    if let Some(other) = event_repo.get_by_name(&request.name).await? {
        if other.id != existing.id {
            return Err(Error::Conflict {
                message: "An event with this name already exists".to_string(),
            });
        }
    }

    let updated = event_repo
        .update(
            existing.id,
            &EventUpdateDBRequest {
                name: request.name.clone(),
                slug: slugify(&request.name),
                description: request.description,
                location: request.location,
                url: request.url,
            },
        )
        .await
        .map_err(|e| map_update_write_error(&slug, e))?;

    Ok(Json(EventResponse::from(updated)))
}

/// The event existed when the handler looked it up, so a write touching zero
/// rows is an inconsistency rather than a client addressing error.
fn map_update_write_error(slug: &str, err: crate::db::errors::DbError) -> Error {
    match err {
        crate::db::errors::DbError::NotFound => Error::Internal {
            operation: format!("update event {slug}: row disappeared mid-update"),
        },
        other => Error::Database(other),
    }
}

/// Delete an event and all of its registrations
#[utoipa::path(
    delete,
    path = "/admin/delete/{slug}",
    tag = "admin",
    params(("slug" = String, Path, description = "Event slug")),
    responses(
        (status = 204, description = "Event deleted"),
        (status = 400, description = "Event not found"),
        (status = 500, description = "Deletion failed"),
    ),
    security(("bearer" = []))
)]
#[tracing::instrument(skip_all, fields(slug = %slug))]
pub async fn delete_event(_admin: AdminUser, State(state): State<AppState>, Path(slug): Path<String>) -> Result<StatusCode, Error> {
    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;

    let event = Events::new(&mut tx).get_by_slug(&slug).await?.ok_or_else(|| Error::BadRequest {
        message: format!("No event with slug {slug}"),
    })?;

    // Registrations reference the event, so they go first. Both deletes share
    // the transaction: either everything is removed or nothing is.
    Registrations::new(&mut tx).delete_for_event(event.id).await?;

    let deleted = Events::new(&mut tx).delete(event.id).await?;
    if !deleted {
        return Err(Error::Internal {
            operation: format!("delete event {slug}"),
        });
    }

    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok(StatusCode::NO_CONTENT)
}
