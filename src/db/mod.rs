//! Database access layer.
//!
//! Split into `models` (request/response structs for each table) and
//! `handlers` (repositories wrapping a `PgConnection`).

pub mod errors;
pub mod handlers;
pub mod models;
