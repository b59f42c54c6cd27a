use axum::{
    extract::{Multipart, Path, State},
    Json,
};

use crate::{
    api::models::users::{CurrentUser, ProfileUpdateRequest, UserResponse},
    db::{
        handlers::{Repository, Users},
        models::users::UserUpdateDBRequest,
    },
    errors::Error,
    images::ImageStore,
    types::UserId,
    AppState,
};

/// Get the authenticated user's profile
#[utoipa::path(
    get,
    path = "/users/me",
    tag = "users",
    responses(
        (status = 200, description = "The authenticated user", body = UserResponse),
        (status = 401, description = "Not authenticated"),
    ),
    security(("bearer" = []))
)]
#[tracing::instrument(skip_all, fields(user_id = user.id))]
pub async fn me(user: CurrentUser, State(state): State<AppState>) -> Result<Json<UserResponse>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let db_user = Users::new(&mut conn).get_by_id(user.id).await?.ok_or_else(|| Error::NotFound {
        resource: "User".to_string(),
        id: user.id.to_string(),
    })?;

    Ok(Json(UserResponse::from(db_user)))
}

/// Update the authenticated user's profile
#[utoipa::path(
    patch,
    path = "/users/me",
    tag = "users",
    request_body = ProfileUpdateRequest,
    responses(
        (status = 200, description = "Profile updated", body = UserResponse),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Not authenticated"),
        (status = 409, description = "Username already taken"),
    ),
    security(("bearer" = []))
)]
#[tracing::instrument(skip_all, fields(user_id = user.id))]
pub async fn update_me(
    user: CurrentUser,
    State(state): State<AppState>,
    Json(request): Json<ProfileUpdateRequest>,
) -> Result<Json<UserResponse>, Error> {
    for (value, field) in [(&request.name, "name"), (&request.username, "username")] {
        if let Some(value) = value {
            if value.is_empty() || value.chars().count() > 64 {
                return Err(Error::BadRequest {
                    message: format!("{field} must be between 1 and 64 characters"),
                });
            }
        }
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    // A unique violation on username surfaces as a 409 through the error mapping
    let updated = Users::new(&mut conn)
        .update(
            user.id,
            &UserUpdateDBRequest {
                name: request.name,
                username: request.username,
                ..Default::default()
            },
        )
        .await?;

    Ok(Json(UserResponse::from(updated)))
}

/// Upload a profile picture for a user
#[utoipa::path(
    put,
    path = "/users/{id}/profile-picture",
    tag = "users",
    params(("id" = i32, Path, description = "User id")),
    responses(
        (status = 200, description = "Profile picture updated", body = UserResponse),
        (status = 400, description = "Unknown user or missing file"),
        (status = 401, description = "Not authenticated"),
        (status = 500, description = "Image store failure"),
    ),
    security(("bearer" = []))
)]
#[tracing::instrument(skip_all, fields(target_id = id, user_id = user.id))]
pub async fn upload_profile_picture(
    user: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<UserId>,
    mut multipart: Multipart,
) -> Result<Json<UserResponse>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut user_repo = Users::new(&mut conn);

    if user_repo.get_by_id(id).await?.is_none() {
        return Err(Error::BadRequest {
            message: format!("No user with id {id}"),
        });
    }

    let field = multipart
        .next_field()
        .await
        .map_err(|e| Error::BadRequest {
            message: format!("Invalid multipart body: {e}"),
        })?
        .ok_or_else(|| Error::BadRequest {
            message: "No file provided".to_string(),
        })?;

    let content_type = field.content_type().unwrap_or("application/octet-stream").to_string();
    let data = field
        .bytes()
        .await
        .map_err(|e| Error::BadRequest {
            message: format!("Failed to read uploaded file: {e}"),
        })?
        .to_vec();

    let store = ImageStore::new(&state.config)?;
    let url = store.upload_profile_image(data, &content_type).await?;

    let updated = user_repo
        .update(
            id,
            &UserUpdateDBRequest {
                profile_picture: Some(url.to_string()),
                ..Default::default()
            },
        )
        .await?;

    Ok(Json(UserResponse::from(updated)))
}
