use axum::Json;

/// API index: a short machine-readable listing of the available routes
#[utoipa::path(
    get,
    path = "/",
    tag = "meta",
    responses(
        (status = 200, description = "Route listing"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn index() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": "eventreg",
        "routes": {
            "signup": "POST /signup",
            "login": "POST /login",
            "logout": "GET /logout",
            "events": "GET /events",
            "event": "GET /events/{slug}",
            "register": "POST /events/{slug}",
            "unregister": "DELETE /events/{slug}",
            "me": "GET /users/me",
            "my_events": "GET /users/me/events",
            "docs": "GET /docs",
        }
    }))
}
