//! API request/response models for events.

use crate::db::models::events::EventDBResponse;
use crate::types::EventId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Query parameters for event listings. Without them, every event is returned.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct EventListQuery {
    /// Number of events to skip
    pub skip: Option<i64>,
    /// Maximum number of events to return
    pub limit: Option<i64>,
}

/// Request body for creating an event
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EventCreate {
    pub name: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub url: Option<String>,
}

/// Request body for updating an event
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EventUpdate {
    pub name: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub url: Option<String>,
}

/// Event representation returned to API clients
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EventResponse {
    pub id: EventId,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub url: Option<String>,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

impl From<EventDBResponse> for EventResponse {
    fn from(db: EventDBResponse) -> Self {
        Self {
            id: db.id,
            name: db.name,
            slug: db.slug,
            description: db.description,
            location: db.location,
            url: db.url,
            created: db.created,
            updated: db.updated,
        }
    }
}

/// Derive a URL-safe slug from an event name.
///
/// Lowercases the name and collapses every run of non-alphanumeric characters
/// into a single hyphen. The result is capped at 64 characters to fit the
/// `events.slug` column.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_was_hyphen = true; // suppress a leading hyphen

    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_was_hyphen = false;
        } else if !last_was_hyphen {
            slug.push('-');
            last_was_hyphen = true;
        }
    }

    while slug.ends_with('-') {
        slug.pop();
    }
    slug.truncate(64);
    slug
}
