//! Store traits the messenger core depends on.
//!
//! The core never holds a concrete database type. It talks to three narrow
//! capability traits, one per persisted aggregate, and every backend
//! ([`crate::db::postgres::PostgresStore`], [`crate::db::in_memory::InMemoryStore`])
//! implements all of them.
//!
//! # Transactions
//!
//! Conference creation writes one conference row plus one membership edge per member.
//! Those writes go through a [`ConferenceTransaction`] opened with
//! [`ConferenceStore::begin`]. Nothing written through a transaction is visible to
//! other callers until [`ConferenceTransaction::commit`] succeeds, and dropping a
//! transaction without committing discards every write made through it.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{
    db::{
        errors::Result,
        models::{
            conferences::{ConferenceCreateDBRequest, ConferenceDBResponse},
            messages::{MessageCreateDBRequest, MessageDBResponse},
            users::{UserCreateDBRequest, UserDBResponse},
        },
    },
    types::{ConferenceId, UserId},
};

/// Credential store: persisted user records.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a user.
    ///
    /// # Errors
    /// - `UniqueViolation` on the `users` table if the username or email is taken
    async fn create_user(&self, request: &UserCreateDBRequest) -> Result<UserDBResponse>;

    async fn get_user_by_id(&self, id: UserId) -> Result<Option<UserDBResponse>>;

    async fn get_user_by_username(&self, username: &str) -> Result<Option<UserDBResponse>>;

    /// Fetch every user whose id is in `ids`. Unknown ids are silently skipped, so the
    /// result can be shorter than the input.
    async fn get_users_by_ids(&self, ids: &[UserId]) -> Result<Vec<UserDBResponse>>;

    /// Set `last_login` for a user.
    ///
    /// # Errors
    /// - `NotFound` if the user doesn't exist
    async fn record_login(&self, id: UserId, at: DateTime<Utc>) -> Result<()>;
}

/// Conference store: conferences and membership edges.
#[async_trait]
pub trait ConferenceStore: Send + Sync {
    /// All conferences `user_id` is a member of, ordered by conference id.
    async fn get_conferences_by_user(&self, user_id: UserId) -> Result<Vec<ConferenceDBResponse>>;

    async fn get_conference(&self, id: ConferenceId) -> Result<Option<ConferenceDBResponse>>;

    /// Open a transactional scope for creating a conference with its members.
    async fn begin(&self) -> Result<Box<dyn ConferenceTransaction>>;
}

/// Transactional scope over the conference store.
///
/// Dropping the value without calling [`commit`](ConferenceTransaction::commit) rolls
/// back every write made through it.
#[async_trait]
pub trait ConferenceTransaction: Send {
    async fn insert_conference(&mut self, request: &ConferenceCreateDBRequest) -> Result<ConferenceDBResponse>;

    /// Insert a membership edge.
    ///
    /// # Errors
    /// - `UniqueViolation` if the edge already exists
    /// - `ForeignKeyViolation` if the user or conference doesn't exist
    async fn insert_member(&mut self, conference_id: ConferenceId, user_id: UserId, joined_at: DateTime<Utc>) -> Result<()>;

    async fn commit(self: Box<Self>) -> Result<()>;
}

/// Message store.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Insert a message and point the owning conference's `last_message` at it, atomically.
    ///
    /// # Errors
    /// - `ForeignKeyViolation` if the conference doesn't exist
    async fn insert_message(&self, request: &MessageCreateDBRequest) -> Result<MessageDBResponse>;

    /// All messages of a conference, ascending by `sent_at` then id.
    async fn get_messages_by_conference(&self, conference_id: ConferenceId) -> Result<Vec<MessageDBResponse>>;
}
