//! PostgreSQL backend for the store traits.
//!
//! [`PostgresStore`] owns a connection pool and implements every trait in
//! [`crate::db::stores`] by delegating to the repositories in
//! [`crate::db::handlers`]. Conference creation runs inside a real database
//! transaction, which is rolled back when [`PgConferenceTransaction`] is dropped
//! without being committed.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction, postgres::PgPoolOptions};
use tracing::{debug, instrument};

use crate::{
    config::PoolSettings,
    db::{
        errors::Result,
        handlers::{Conferences, Messages, Users},
        models::{
            conferences::{ConferenceCreateDBRequest, ConferenceDBResponse},
            messages::{MessageCreateDBRequest, MessageDBResponse},
            users::{UserCreateDBRequest, UserDBResponse},
        },
        stores::{ConferenceStore, ConferenceTransaction, MessageStore, UserStore},
    },
    types::{ConferenceId, UserId},
};

#[derive(Clone, Debug)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a pool against `url` using the given settings. Zero timeouts disable the
    /// corresponding limit.
    pub async fn connect(url: &str, settings: &PoolSettings) -> anyhow::Result<Self> {
        let mut options = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .min_connections(settings.min_connections)
            .acquire_timeout(Duration::from_secs(settings.acquire_timeout_secs));

        options = options.idle_timeout((settings.idle_timeout_secs > 0).then(|| Duration::from_secs(settings.idle_timeout_secs)));
        options = options.max_lifetime((settings.max_lifetime_secs > 0).then(|| Duration::from_secs(settings.max_lifetime_secs)));

        let pool = options.connect(url).await?;
        debug!(max_connections = settings.max_connections, "Connected to database");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl UserStore for PostgresStore {
    async fn create_user(&self, request: &UserCreateDBRequest) -> Result<UserDBResponse> {
        let mut conn = self.pool.acquire().await?;
        Users::new(&mut conn).create(request).await
    }

    async fn get_user_by_id(&self, id: UserId) -> Result<Option<UserDBResponse>> {
        let mut conn = self.pool.acquire().await?;
        Users::new(&mut conn).get_by_id(id).await
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<UserDBResponse>> {
        let mut conn = self.pool.acquire().await?;
        Users::new(&mut conn).get_by_username(username).await
    }

    async fn get_users_by_ids(&self, ids: &[UserId]) -> Result<Vec<UserDBResponse>> {
        let mut conn = self.pool.acquire().await?;
        Users::new(&mut conn).get_bulk(ids).await
    }

    async fn record_login(&self, id: UserId, at: DateTime<Utc>) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        Users::new(&mut conn).record_login(id, at).await
    }
}

#[async_trait]
impl ConferenceStore for PostgresStore {
    async fn get_conferences_by_user(&self, user_id: UserId) -> Result<Vec<ConferenceDBResponse>> {
        let mut conn = self.pool.acquire().await?;
        Conferences::new(&mut conn).get_user_conferences(user_id).await
    }

    async fn get_conference(&self, id: ConferenceId) -> Result<Option<ConferenceDBResponse>> {
        let mut conn = self.pool.acquire().await?;
        Conferences::new(&mut conn).get_by_id(id).await
    }

    async fn begin(&self) -> Result<Box<dyn ConferenceTransaction>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgConferenceTransaction { tx }))
    }
}

#[async_trait]
impl MessageStore for PostgresStore {
    #[instrument(skip(self, request), fields(conference_id = request.conference_id), err)]
    async fn insert_message(&self, request: &MessageCreateDBRequest) -> Result<MessageDBResponse> {
        let mut tx = self.pool.begin().await?;
        let message = Messages::new(&mut tx).create(request).await?;
        Conferences::new(&mut tx).set_last_message(request.conference_id, message.id).await?;
        tx.commit().await?;
        Ok(message)
    }

    async fn get_messages_by_conference(&self, conference_id: ConferenceId) -> Result<Vec<MessageDBResponse>> {
        let mut conn = self.pool.acquire().await?;
        Messages::new(&mut conn).list_for_conference(conference_id).await
    }
}

/// Conference-creation scope backed by a database transaction.
pub struct PgConferenceTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl ConferenceTransaction for PgConferenceTransaction {
    async fn insert_conference(&mut self, request: &ConferenceCreateDBRequest) -> Result<ConferenceDBResponse> {
        Conferences::new(&mut self.tx).create(request).await
    }

    async fn insert_member(&mut self, conference_id: ConferenceId, user_id: UserId, joined_at: DateTime<Utc>) -> Result<()> {
        Conferences::new(&mut self.tx).add_member(conference_id, user_id, joined_at).await
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
