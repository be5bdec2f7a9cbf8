//! HTTP request handlers, organized by resource type.
//!
//! - [`auth`]: registration, login and logout
//! - [`conferences`]: conference creation and listing, plus reading and posting messages
//! - [`users`]: user lookup
//!
//! Handlers that need a logged-in user take a
//! [`CurrentUser`](crate::api::models::users::CurrentUser) argument; the extractor rejects the
//! request with 401 before the handler runs.

pub mod auth;
pub mod conferences;
pub mod users;
