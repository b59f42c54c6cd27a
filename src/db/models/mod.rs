//! Database request/response models.

pub mod events;
pub mod registrations;
pub mod users;
