//! API request and response data models.
//!
//! These types define the public wire contract. They are kept separate from
//! [`crate::db::models`] and converted with `From` impls; in particular
//! [`users::UserResponse`] has no field for the password digest, so it can never
//! be serialized.

pub mod auth;
pub mod conferences;
pub mod messages;
pub mod users;
