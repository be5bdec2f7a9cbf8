//! Authentication: credentials, password digests and sessions.
//!
//! # Flow
//!
//! - `POST /signUp` hashes the password ([`password`]) and stores the user.
//! - `POST /login` checks the credentials with an [`Authenticator`], then issues a
//!   signed JWT ([`session`]) in an HttpOnly cookie.
//! - Every protected handler takes a [`CurrentUser`](crate::api::models::users::CurrentUser)
//!   argument; the extractor in [`current_user`] verifies the cookie and rejects the
//!   request with 401 when it's missing, expired or tampered with.
//!
//! ```ignore
//! use messenger::api::models::users::CurrentUser;
//!
//! async fn protected_handler(current_user: CurrentUser) -> String {
//!     format!("Hello, {}!", current_user.username)
//! }
//! ```
//!
//! Unknown usernames and wrong passwords are distinct [`AuthError`] variants so they
//! can be logged apart, but both produce the same 401 response.

pub mod authenticator;
pub mod current_user;
pub mod password;
pub mod session;

pub use authenticator::{AuthError, Authenticator};
