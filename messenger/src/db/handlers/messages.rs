//! Database repository for messages.

use crate::{
    db::{
        errors::Result,
        models::messages::{MessageCreateDBRequest, MessageDBResponse},
    },
    types::ConferenceId,
};
use sqlx::PgConnection;
use tracing::instrument;

pub struct Messages<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Messages<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request), fields(conference_id = request.conference_id, user_id = request.user_id), err)]
    pub async fn create(&mut self, request: &MessageCreateDBRequest) -> Result<MessageDBResponse> {
        let message = sqlx::query_as::<_, MessageDBResponse>(
            r#"
            INSERT INTO messages (conference_id, user_id, text, sent_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, conference_id, user_id, text, sent_at
            "#,
        )
        .bind(request.conference_id)
        .bind(request.user_id)
        .bind(&request.text)
        .bind(request.sent_at)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(message)
    }

    #[instrument(skip(self), err)]
    pub async fn list_for_conference(&mut self, conference_id: ConferenceId) -> Result<Vec<MessageDBResponse>> {
        let messages = sqlx::query_as::<_, MessageDBResponse>(
            r#"
            SELECT id, conference_id, user_id, text, sent_at
            FROM messages
            WHERE conference_id = $1
            ORDER BY sent_at ASC, id ASC
            "#,
        )
        .bind(conference_id)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(messages)
    }
}
