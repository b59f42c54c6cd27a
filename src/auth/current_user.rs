//! Request extractors resolving authentication state.
//!
//! Authentication is resolved exactly once per request into an [`Authentication`]
//! value. Handlers pick the guard they need:
//!
//! - [`Authentication`]: never rejects, exposes the anonymous case
//! - [`CurrentUser`]: rejects with 401 when no valid credentials are present
//! - [`AdminUser`]: additionally rejects with 403 for non-admin users

use crate::{
    api::models::users::CurrentUser,
    auth::session,
    errors::{Error, Result},
    AppState,
};
use axum::{extract::FromRequestParts, http::request::Parts};
use tracing::{debug, instrument, trace};

/// The authentication state of a request, resolved from its credentials.
#[derive(Debug, Clone)]
pub enum Authentication {
    /// No credentials presented
    Anonymous,
    /// Authenticated via the session cookie
    Session(CurrentUser),
    /// Authenticated via an Authorization bearer token
    Bearer(CurrentUser),
}

impl Authentication {
    /// The authenticated user, if any.
    pub fn user(self) -> Option<CurrentUser> {
        match self {
            Authentication::Anonymous => None,
            Authentication::Session(user) | Authentication::Bearer(user) => Some(user),
        }
    }
}

/// Extract user from bearer token in the Authorization header if present and valid
/// Returns:
/// - None: No Authorization header or not a Bearer token
/// - Some(Ok(user)): Valid token found and verified
/// - Some(Err(error)): Bearer token present but invalid/expired
#[instrument(skip(parts, config))]
fn try_bearer_auth(parts: &Parts, config: &crate::config::Config) -> Option<Result<CurrentUser>> {
    let auth_header = parts.headers.get(axum::http::header::AUTHORIZATION)?;

    let auth_str = match auth_header.to_str() {
        Ok(s) => s,
        Err(e) => {
            return Some(Err(Error::BadRequest {
                message: format!("Invalid authorization header: {e}"),
            }))
        }
    };

    let token = auth_str.strip_prefix("Bearer ")?;
    if token.is_empty() {
        return Some(Err(Error::Unauthenticated {
            message: Some("Bearer token missing".to_string()),
        }));
    }

    Some(session::verify_session_token(token, config))
}

/// Extract user from the JWT session cookie if present and valid
/// Returns:
/// - None: No session cookie present
/// - Some(Ok(user)): Valid JWT found and verified
/// - Some(Err(error)): Cookie header present but malformed
#[instrument(skip(parts, config))]
fn try_session_cookie_auth(parts: &Parts, config: &crate::config::Config) -> Option<Result<CurrentUser>> {
    let cookie_header = parts.headers.get(axum::http::header::COOKIE)?;

    let cookie_str = match cookie_header.to_str() {
        Ok(s) => s,
        Err(e) => {
            return Some(Err(Error::BadRequest {
                message: format!("Invalid cookie header: {e}"),
            }))
        }
    };
    let cookie_name = &config.auth.session.cookie_name;

    for cookie in cookie_str.split(';') {
        let cookie = cookie.trim();
        if let Some((name, value)) = cookie.split_once('=') {
            if name == cookie_name {
                match session::verify_session_token(value, config) {
                    Ok(user) => return Some(Ok(user)),
                    Err(_) => {
                        // Invalid/expired token, keep checking other cookies.
                        // Verification errors are expected for stale cookies and not propagated.
                        continue;
                    }
                }
            }
        }
    }
    None
}

impl FromRequestParts<AppState> for Authentication {
    type Rejection = Error;

    #[instrument(skip(parts, state))]
    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        // Try the bearer token first (most specific), then the session cookie.
        // Each method returns Option<Result<CurrentUser>>:
        // - None means the auth method is not applicable (no credentials present)
        // - Some(Ok(user)) means successful authentication
        // - Some(Err(error)) means credentials were present but invalid

        match try_bearer_auth(parts, &state.config) {
            Some(Ok(user)) => {
                debug!("Found bearer authenticated user: {}", user.id);
                return Ok(Authentication::Bearer(user));
            }
            Some(Err(e)) => {
                trace!("Bearer authentication failed: {:?}", e);
                return Err(Error::Unauthenticated { message: None });
            }
            None => {
                trace!("No bearer authentication attempted");
            }
        }

        match try_session_cookie_auth(parts, &state.config) {
            Some(Ok(user)) => {
                debug!("Found session authenticated user: {}", user.id);
                return Ok(Authentication::Session(user));
            }
            Some(Err(e)) => {
                trace!("Session authentication failed: {:?}", e);
                return Err(Error::Unauthenticated { message: None });
            }
            None => {
                trace!("No authentication credentials found in request");
            }
        }

        Ok(Authentication::Anonymous)
    }
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let auth = Authentication::from_request_parts(parts, state).await?;
        auth.user().ok_or(Error::Unauthenticated { message: None })
    }
}

/// Guard extractor for admin-only routes.
#[derive(Debug, Clone)]
pub struct AdminUser(pub CurrentUser);

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let user = CurrentUser::from_request_parts(parts, state).await?;
        if user.is_admin {
            Ok(AdminUser(user))
        } else {
            Err(Error::InsufficientPermissions {
                resource: parts.uri.path().to_string(),
            })
        }
    }
}
