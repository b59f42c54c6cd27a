//! OpenAPI documentation for the event registration API.

use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};

use crate::api;

/// Registers the bearer security scheme referenced by the protected routes.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.security_schemes.insert(
                "bearer".to_string(),
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some(
                            "Session token authentication. Obtain a token via `POST /login` and \
                            include it in the `Authorization` header:\n\n\
                            ```\nAuthorization: Bearer YOUR_TOKEN\n```\n\n\
                            The same token is also set as an HttpOnly session cookie on login.",
                        ))
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    paths(
        api::handlers::index::index,
        api::handlers::auth::signup,
        api::handlers::auth::login,
        api::handlers::auth::logout,
        api::handlers::events::list_events,
        api::handlers::events::get_event,
        api::handlers::events::admin_list_events,
        api::handlers::events::admin_get_event,
        api::handlers::events::create_event,
        api::handlers::events::update_event,
        api::handlers::events::delete_event,
        api::handlers::registrations::register,
        api::handlers::registrations::unregister,
        api::handlers::registrations::list_registrants,
        api::handlers::registrations::my_events,
        api::handlers::users::me,
        api::handlers::users::update_me,
        api::handlers::users::upload_profile_picture,
    ),
    components(schemas(
        api::models::users::SignupRequest,
        api::models::users::ProfileUpdateRequest,
        api::models::users::UserResponse,
        api::models::auth::LoginRequest,
        api::models::auth::TokenResponse,
        api::models::auth::AuthSuccessResponse,
        api::models::events::EventCreate,
        api::models::events::EventUpdate,
        api::models::events::EventResponse,
        api::models::registrations::RegistrationRequest,
        api::models::registrations::RegistrationResponse,
        api::models::registrations::RegistrantResponse,
    )),
    tags(
        (name = "meta", description = "Service metadata"),
        (name = "authentication", description = "Account creation and sessions"),
        (name = "events", description = "Public event browsing"),
        (name = "registrations", description = "Event registrations"),
        (name = "users", description = "User profiles"),
        (name = "admin", description = "Event management (admin only)"),
    ),
    info(
        title = "eventreg API",
        description = "Event registration service: browse events, create an account and register."
    )
)]
pub struct ApiDoc;
