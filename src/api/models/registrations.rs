//! API request/response models for registrations.

use crate::db::models::registrations::{RegistrantDBResponse, RegistrationDBResponse};
use crate::types::{EventId, RegistrationId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Maximum accepted registration comment length, in characters
pub const MAX_COMMENT_LENGTH: usize = 400;

/// Request body for registering to an event
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct RegistrationRequest {
    pub comment: Option<String>,
}

/// Registration representation returned to API clients
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RegistrationResponse {
    pub id: RegistrationId,
    pub comment: Option<String>,
    pub event: EventId,
    pub user_id: UserId,
    pub created: DateTime<Utc>,
}

impl From<RegistrationDBResponse> for RegistrationResponse {
    fn from(db: RegistrationDBResponse) -> Self {
        Self {
            id: db.id,
            comment: db.comment,
            event: db.event,
            user_id: db.user_id,
            created: db.created,
        }
    }
}

/// A registrant entry for admin listings: registration joined with its user
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RegistrantResponse {
    pub id: RegistrationId,
    pub user_id: UserId,
    pub name: String,
    pub username: String,
    pub comment: Option<String>,
    pub created: DateTime<Utc>,
}

impl From<RegistrantDBResponse> for RegistrantResponse {
    fn from(db: RegistrantDBResponse) -> Self {
        Self {
            id: db.id,
            user_id: db.user_id,
            name: db.name,
            username: db.username,
            comment: db.comment,
            created: db.created,
        }
    }
}
