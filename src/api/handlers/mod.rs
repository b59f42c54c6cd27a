//! Axum request handlers.

pub mod auth;
pub mod events;
pub mod index;
pub mod registrations;
pub mod users;
