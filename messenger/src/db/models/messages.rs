//! Database models for messages.

use crate::types::{ConferenceId, MessageId, UserId};
use chrono::{DateTime, Utc};

/// Database request for inserting a message
#[derive(Debug, Clone)]
pub struct MessageCreateDBRequest {
    pub conference_id: ConferenceId,
    pub user_id: UserId,
    pub text: String,
    pub sent_at: DateTime<Utc>,
}

/// Database response for a message
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct MessageDBResponse {
    pub id: MessageId,
    pub conference_id: ConferenceId,
    /// Nulled when the author is deleted
    pub user_id: Option<UserId>,
    pub text: String,
    pub sent_at: DateTime<Utc>,
}
