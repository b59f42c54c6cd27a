//! Database models for event registrations.

use crate::types::{EventId, RegistrationId, UserId};
use chrono::{DateTime, Utc};

/// Database request for creating a registration
#[derive(Debug, Clone)]
pub struct RegistrationCreateDBRequest {
    pub comment: Option<String>,
    pub event: EventId,
    pub user_id: UserId,
}

/// Database response for a registration
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RegistrationDBResponse {
    pub id: RegistrationId,
    pub comment: Option<String>,
    pub event: EventId,
    pub user_id: UserId,
    pub created: DateTime<Utc>,
}

/// A registration joined with the registered user, for admin listings
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RegistrantDBResponse {
    pub id: RegistrationId,
    pub user_id: UserId,
    pub name: String,
    pub username: String,
    pub comment: Option<String>,
    pub created: DateTime<Utc>,
}
