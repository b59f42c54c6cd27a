//! Database repositories.

pub mod events;
pub mod registrations;
pub mod repository;
pub mod users;

pub use events::Events;
pub use registrations::Registrations;
pub use repository::Repository;
pub use users::Users;
