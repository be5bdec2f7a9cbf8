//! Repository implementations for PostgreSQL access.
//!
//! Each repository wraps a borrowed [`sqlx::PgConnection`] (a pooled connection
//! or an open transaction), binds parameters, and returns records from
//! [`crate::db::models`]. Errors are classified through [`crate::db::errors::DbError`].
//!
//! - [`Users`]: user accounts and login bookkeeping
//! - [`Conferences`]: conferences and membership edges
//! - [`Messages`]: messages posted to conferences

pub mod conferences;
pub mod messages;
pub mod users;

pub use conferences::Conferences;
pub use messages::Messages;
pub use users::Users;
