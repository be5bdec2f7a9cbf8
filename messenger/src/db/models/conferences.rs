//! Database models for conferences.

use crate::types::{ConferenceId, MessageId, UserId};
use chrono::{DateTime, Utc};

/// Database request for creating a conference row
#[derive(Debug, Clone)]
pub struct ConferenceCreateDBRequest {
    pub name: String,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
}

/// Database response for a conference
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct ConferenceDBResponse {
    pub id: ConferenceId,
    pub name: String,
    /// Nulled when the creating user is deleted
    pub created_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub last_message: Option<MessageId>,
}
