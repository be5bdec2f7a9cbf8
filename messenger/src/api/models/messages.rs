//! API request/response models for messages.

use crate::db::models::messages::MessageDBResponse;
use crate::types::{ConferenceId, MessageId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageCreate {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub id: MessageId,
    pub conference_id: ConferenceId,
    /// Author; absent once the author has been deleted
    pub user_id: Option<UserId>,
    pub text: String,
    pub sent_at: DateTime<Utc>,
}

impl From<MessageDBResponse> for MessageResponse {
    fn from(db: MessageDBResponse) -> Self {
        Self {
            id: db.id,
            conference_id: db.conference_id,
            user_id: db.user_id,
            text: db.text,
            sent_at: db.sent_at,
        }
    }
}
