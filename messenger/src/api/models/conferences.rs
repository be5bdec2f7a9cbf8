//! API request/response models for conferences.

use crate::db::models::conferences::ConferenceDBResponse;
use crate::types::{ConferenceId, MessageId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

fn default_add_creator() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ConferenceCreate {
    pub name: String,
    /// Initial members. Duplicates are ignored.
    #[serde(default, alias = "users_ids")]
    pub member_ids: Vec<UserId>,
    /// Also make the requesting user a member (default: true)
    #[serde(default = "default_add_creator")]
    pub add_creator: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ConferenceResponse {
    pub id: ConferenceId,
    pub name: String,
    /// Absent once the creating user has been deleted
    pub created_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub last_message: Option<MessageId>,
}

impl From<ConferenceDBResponse> for ConferenceResponse {
    fn from(db: ConferenceDBResponse) -> Self {
        Self {
            id: db.id,
            name: db.name,
            created_by: db.created_by,
            created_at: db.created_at,
            last_message: db.last_message,
        }
    }
}
