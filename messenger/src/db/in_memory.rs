//! In-memory backend for the store traits.
//!
//! All tables live behind a single [`parking_lot::RwLock`]. It's suitable for tests
//! and single-process deployments; everything is lost on restart.
//!
//! Constraint checks mirror the PostgreSQL schema so callers see the same
//! [`DbError`] classification from either backend: unique username and email,
//! one edge per (conference, user) pair, and foreign keys from members and messages.
//!
//! A [`ConferenceTransaction`] buffers its writes and applies them under one write
//! lock on commit. Ids are allocated eagerly, so an id handed out by a
//! transaction that is later dropped is never reused, as with a database sequence.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use crate::{
    db::{
        errors::{DbError, Result},
        models::{
            conferences::{ConferenceCreateDBRequest, ConferenceDBResponse},
            messages::{MessageCreateDBRequest, MessageDBResponse},
            users::{UserCreateDBRequest, UserDBResponse},
        },
        stores::{ConferenceStore, ConferenceTransaction, MessageStore, UserStore},
    },
    types::{ConferenceId, MessageId, UserId},
};

#[derive(Default)]
struct Tables {
    users: BTreeMap<UserId, UserDBResponse>,
    conferences: BTreeMap<ConferenceId, ConferenceDBResponse>,
    members: BTreeMap<(ConferenceId, UserId), DateTime<Utc>>,
    messages: BTreeMap<MessageId, MessageDBResponse>,
    next_user_id: UserId,
    next_conference_id: ConferenceId,
    next_message_id: MessageId,
}

impl Tables {
    fn allocate_conference_id(&mut self) -> ConferenceId {
        self.next_conference_id += 1;
        self.next_conference_id
    }
}

fn unique_violation(table: &str, constraint: &str) -> DbError {
    DbError::UniqueViolation {
        constraint: Some(constraint.to_string()),
        table: Some(table.to_string()),
        message: format!("duplicate key value violates unique constraint \"{constraint}\""),
    }
}

fn foreign_key_violation(table: &str, constraint: &str) -> DbError {
    DbError::ForeignKeyViolation {
        constraint: Some(constraint.to_string()),
        table: Some(table.to_string()),
        message: format!("insert or update on table \"{table}\" violates foreign key constraint \"{constraint}\""),
    }
}

/// In-memory implementation of every store trait.
///
/// Cloning is cheap and clones share the same tables.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn create_user(&self, request: &UserCreateDBRequest) -> Result<UserDBResponse> {
        let mut tables = self.tables.write();

        if tables.users.values().any(|u| u.username == request.username) {
            return Err(unique_violation("users", "users_username_key"));
        }
        if tables.users.values().any(|u| u.email == request.email) {
            return Err(unique_violation("users", "users_email_key"));
        }

        tables.next_user_id += 1;
        let user = UserDBResponse {
            id: tables.next_user_id,
            username: request.username.clone(),
            email: request.email.clone(),
            password_hash: request.password_hash.clone(),
            created_at: Utc::now(),
            last_login: None,
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_user_by_id(&self, id: UserId) -> Result<Option<UserDBResponse>> {
        Ok(self.tables.read().users.get(&id).cloned())
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<UserDBResponse>> {
        Ok(self.tables.read().users.values().find(|u| u.username == username).cloned())
    }

    async fn get_users_by_ids(&self, ids: &[UserId]) -> Result<Vec<UserDBResponse>> {
        let tables = self.tables.read();
        Ok(tables.users.values().filter(|u| ids.contains(&u.id)).cloned().collect())
    }

    async fn record_login(&self, id: UserId, at: DateTime<Utc>) -> Result<()> {
        let mut tables = self.tables.write();
        let user = tables.users.get_mut(&id).ok_or(DbError::NotFound)?;
        user.last_login = Some(at);
        Ok(())
    }
}

#[async_trait]
impl ConferenceStore for InMemoryStore {
    async fn get_conferences_by_user(&self, user_id: UserId) -> Result<Vec<ConferenceDBResponse>> {
        let tables = self.tables.read();
        Ok(tables
            .conferences
            .values()
            .filter(|c| tables.members.contains_key(&(c.id, user_id)))
            .cloned()
            .collect())
    }

    async fn get_conference(&self, id: ConferenceId) -> Result<Option<ConferenceDBResponse>> {
        Ok(self.tables.read().conferences.get(&id).cloned())
    }

    async fn begin(&self) -> Result<Box<dyn ConferenceTransaction>> {
        Ok(Box::new(InMemoryConferenceTransaction {
            tables: Arc::clone(&self.tables),
            conferences: Vec::new(),
            members: Vec::new(),
        }))
    }
}

#[async_trait]
impl MessageStore for InMemoryStore {
    async fn insert_message(&self, request: &MessageCreateDBRequest) -> Result<MessageDBResponse> {
        let mut tables = self.tables.write();

        if !tables.users.contains_key(&request.user_id) {
            return Err(foreign_key_violation("messages", "messages_user_id_fkey"));
        }
        if !tables.conferences.contains_key(&request.conference_id) {
            return Err(foreign_key_violation("messages", "messages_conference_id_fkey"));
        }

        tables.next_message_id += 1;
        let message = MessageDBResponse {
            id: tables.next_message_id,
            conference_id: request.conference_id,
            user_id: Some(request.user_id),
            text: request.text.clone(),
            sent_at: request.sent_at,
        };
        tables.messages.insert(message.id, message.clone());
        if let Some(conference) = tables.conferences.get_mut(&request.conference_id) {
            conference.last_message = Some(message.id);
        }
        Ok(message)
    }

    async fn get_messages_by_conference(&self, conference_id: ConferenceId) -> Result<Vec<MessageDBResponse>> {
        let tables = self.tables.read();
        let mut messages: Vec<MessageDBResponse> = tables
            .messages
            .values()
            .filter(|m| m.conference_id == conference_id)
            .cloned()
            .collect();
        messages.sort_by(|a, b| a.sent_at.cmp(&b.sent_at).then(a.id.cmp(&b.id)));
        Ok(messages)
    }
}

/// Buffered conference-creation scope over an [`InMemoryStore`].
pub struct InMemoryConferenceTransaction {
    tables: Arc<RwLock<Tables>>,
    conferences: Vec<ConferenceDBResponse>,
    members: Vec<(ConferenceId, UserId, DateTime<Utc>)>,
}

#[async_trait]
impl ConferenceTransaction for InMemoryConferenceTransaction {
    async fn insert_conference(&mut self, request: &ConferenceCreateDBRequest) -> Result<ConferenceDBResponse> {
        let mut tables = self.tables.write();
        if !tables.users.contains_key(&request.created_by) {
            return Err(foreign_key_violation("conferences", "conferences_created_by_fkey"));
        }

        let conference = ConferenceDBResponse {
            id: tables.allocate_conference_id(),
            name: request.name.clone(),
            created_by: Some(request.created_by),
            created_at: request.created_at,
            last_message: None,
        };
        self.conferences.push(conference.clone());
        Ok(conference)
    }

    async fn insert_member(&mut self, conference_id: ConferenceId, user_id: UserId, joined_at: DateTime<Utc>) -> Result<()> {
        let tables = self.tables.read();

        let conference_known =
            self.conferences.iter().any(|c| c.id == conference_id) || tables.conferences.contains_key(&conference_id);
        if !conference_known {
            return Err(foreign_key_violation("conference_members", "conference_members_conference_id_fkey"));
        }
        if !tables.users.contains_key(&user_id) {
            return Err(foreign_key_violation("conference_members", "conference_members_user_id_fkey"));
        }

        let duplicate = tables.members.contains_key(&(conference_id, user_id))
            || self.members.iter().any(|(c, u, _)| *c == conference_id && *u == user_id);
        if duplicate {
            return Err(unique_violation("conference_members", "conference_members_pkey"));
        }

        drop(tables);
        self.members.push((conference_id, user_id, joined_at));
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let mut tables = self.tables.write();
        for conference in self.conferences {
            tables.conferences.insert(conference.id, conference);
        }
        for (conference_id, user_id, joined_at) in self.members {
            tables.members.insert((conference_id, user_id), joined_at);
        }
        Ok(())
    }
}
