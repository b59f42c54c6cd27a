//! Database models for events.

use crate::types::EventId;
use chrono::{DateTime, Utc};

/// Database request for creating a new event
#[derive(Debug, Clone)]
pub struct EventCreateDBRequest {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub url: Option<String>,
}

/// Database request for updating an event
///
/// Name, slug and description are always rewritten; location and url are
/// cleared when absent, matching the full-replace semantics of the admin API.
#[derive(Debug, Clone)]
pub struct EventUpdateDBRequest {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub url: Option<String>,
}

/// Database response for an event
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EventDBResponse {
    pub id: EventId,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub url: Option<String>,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}
