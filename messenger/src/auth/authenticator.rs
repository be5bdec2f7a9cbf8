//! Username/password authentication against the user store.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, instrument};

use crate::{
    auth::password,
    db::{errors::DbError, models::users::UserDBResponse, stores::UserStore},
    messenger::ErrorKind,
    types::UserId,
};

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("no user with that username")]
    NoSuchUser,

    #[error("password does not match")]
    WrongPassword,

    #[error("failed to look up user")]
    LookupFailed(#[source] DbError),

    #[error("password verification task failed")]
    VerificationFailed(#[source] tokio::task::JoinError),
}

impl AuthError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::NoSuchUser | AuthError::WrongPassword => ErrorKind::Unauthorized,
            AuthError::LookupFailed(_) | AuthError::VerificationFailed(_) => ErrorKind::StoreFailure,
        }
    }
}

/// Checks credentials. Has no side effects: recording the login is left to the caller.
#[derive(Clone)]
pub struct Authenticator {
    users: Arc<dyn UserStore>,
}

impl Authenticator {
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self { users }
    }

    /// Resolve a username/password pair to a user id.
    pub async fn authorize(&self, username: &str, password: &str) -> Result<UserId, AuthError> {
        self.authenticate(username, password).await.map(|user| user.id)
    }

    /// Like [`authorize`](Self::authorize), but returns the whole user record.
    #[instrument(skip(self, password), err)]
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<UserDBResponse, AuthError> {
        let user = self
            .users
            .get_user_by_username(username)
            .await
            .map_err(AuthError::LookupFailed)?
            .ok_or(AuthError::NoSuchUser)?;

        // Verify on a blocking thread to avoid blocking the async runtime
        let password = password.to_string();
        let hash = user.password_hash.clone();
        let verified = tokio::task::spawn_blocking(move || password::verify_string(&password, &hash))
            .await
            .map_err(AuthError::VerificationFailed)?;

        match verified {
            Ok(true) => Ok(user),
            Ok(false) => Err(AuthError::WrongPassword),
            Err(e) => {
                debug!(user_id = user.id, error = %e, "Stored digest could not be parsed");
                Err(AuthError::WrongPassword)
            }
        }
    }
}
