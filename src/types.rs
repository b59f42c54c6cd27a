//! Identifier types shared between the API and database layers.

/// Identifier for a user row
pub type UserId = i32;

/// Identifier for an event row
pub type EventId = i32;

/// Identifier for a registration row
pub type RegistrationId = i32;
