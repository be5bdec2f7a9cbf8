//! Messenger core: registration, conferences, membership checks and messages.
//!
//! [`Messenger`] holds only shared handles to the stores and the password hashing
//! parameters, so it's cheap to clone into every request. It never touches the
//! network; the HTTP layer in [`crate::api`] translates requests into calls here and
//! [`MessengerError`]s into responses.
//!
//! Conference creation is the one multi-write operation. The conference row and all
//! of its membership edges go through a single [`ConferenceTransaction`]; if any edge
//! fails to insert, the transaction is dropped uncommitted and nothing is persisted.

use std::sync::Arc;

use bon::Builder;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{instrument, warn};

use crate::{
    auth::password::{self, Argon2Params},
    db::{
        errors::DbError,
        models::{
            conferences::{ConferenceCreateDBRequest, ConferenceDBResponse},
            messages::{MessageCreateDBRequest, MessageDBResponse},
            users::{UserCreateDBRequest, UserDBResponse},
        },
        stores::{ConferenceStore, ConferenceTransaction, MessageStore, UserStore},
    },
    types::{ConferenceId, UserId, dedup_preserving_order},
};

pub type User = UserDBResponse;
pub type Conference = ConferenceDBResponse;
pub type Message = MessageDBResponse;

/// Coarse classification of core failures, used to pick a response at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Unauthorized,
    Conflict,
    Validation,
    StoreFailure,
    PartialFailure,
}

#[derive(Error, Debug)]
pub enum MessengerError {
    #[error("failed to hash password")]
    HashingFailed(#[source] anyhow::Error),

    #[error("username or email is already registered")]
    DuplicateUser,

    #[error("unknown member ids: {missing:?}")]
    UnknownMember { missing: Vec<UserId> },

    /// A membership edge could not be written; the conference was rolled back.
    #[error("failed to add user {user_id} to the new conference")]
    MembershipCreationFailed {
        user_id: UserId,
        #[source]
        source: DbError,
    },

    #[error("user {0} not found")]
    UserNotFound(UserId),

    #[error("user {user_id} is not a member of conference {conference_id}")]
    NotMember { user_id: UserId, conference_id: ConferenceId },

    #[error("failed to {operation}")]
    StoreFailed {
        operation: &'static str,
        #[source]
        source: DbError,
    },
}

impl MessengerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            MessengerError::HashingFailed(_) => ErrorKind::StoreFailure,
            MessengerError::DuplicateUser => ErrorKind::Conflict,
            MessengerError::UnknownMember { .. } => ErrorKind::Validation,
            MessengerError::MembershipCreationFailed { .. } => ErrorKind::PartialFailure,
            MessengerError::UserNotFound(_) => ErrorKind::NotFound,
            MessengerError::NotMember { .. } => ErrorKind::Unauthorized,
            MessengerError::StoreFailed { .. } => ErrorKind::StoreFailure,
        }
    }
}

pub type Result<T> = std::result::Result<T, MessengerError>;

fn store_failed(operation: &'static str) -> impl FnOnce(DbError) -> MessengerError {
    move |source| MessengerError::StoreFailed { operation, source }
}

/// Request to create a conference together with its initial members.
#[derive(Debug, Clone)]
pub struct ConferenceCreate {
    /// Initial members. Duplicates are ignored; order is otherwise preserved.
    pub member_ids: Vec<UserId>,
    pub name: String,
    pub created_by: UserId,
    /// Creation time, also used as every initial member's `joined_at`
    pub created_at: DateTime<Utc>,
    /// Make the creator a member even if absent from `member_ids`
    pub add_creator: bool,
}

impl ConferenceCreate {
    /// The member list actually written: deduplicated, with the creator appended when requested.
    fn normalized_members(&self) -> Vec<UserId> {
        let mut members = dedup_preserving_order(&self.member_ids);
        if self.add_creator && !members.contains(&self.created_by) {
            members.push(self.created_by);
        }
        members
    }
}

#[derive(Debug, Clone)]
pub struct MessageCreate {
    pub conference_id: ConferenceId,
    pub user_id: UserId,
    pub text: String,
    pub sent_at: DateTime<Utc>,
}

#[derive(Clone, Builder)]
pub struct Messenger {
    users: Arc<dyn UserStore>,
    conferences: Arc<dyn ConferenceStore>,
    messages: Arc<dyn MessageStore>,
    #[builder(default)]
    password_params: Argon2Params,
}

impl Messenger {
    /// Build a messenger whose three stores are all served by `store`.
    pub fn new<S>(store: S, password_params: Argon2Params) -> Self
    where
        S: UserStore + ConferenceStore + MessageStore + 'static,
    {
        let store = Arc::new(store);
        Self {
            users: store.clone(),
            conferences: store.clone(),
            messages: store,
            password_params,
        }
    }

    pub fn users(&self) -> &Arc<dyn UserStore> {
        &self.users
    }

    /// Register a new account.
    ///
    /// No password-strength or email-format rules are applied.
    #[instrument(skip(self, email, password), err)]
    pub async fn register(&self, username: &str, email: &str, password: &str) -> Result<User> {
        let params = self.password_params;
        let password = password.to_string();
        let password_hash = tokio::task::spawn_blocking(move || password::hash_string_with_params(&password, params))
            .await
            .map_err(|e| MessengerError::HashingFailed(e.into()))?
            .map_err(|e| MessengerError::HashingFailed(e.into()))?;

        let request = UserCreateDBRequest {
            username: username.to_string(),
            email: email.to_string(),
            password_hash,
        };

        match self.users.create_user(&request).await {
            Ok(user) => Ok(user),
            Err(e) if e.is_duplicate_user() => Err(MessengerError::DuplicateUser),
            Err(e) => Err(store_failed("create user")(e)),
        }
    }

    /// Create a conference and its member set as one unit.
    ///
    /// Member ids are validated up front; an unknown id fails the whole request before
    /// anything is written.
    #[instrument(skip(self, request), fields(name = %request.name, created_by = request.created_by), err)]
    pub async fn create_conference(&self, request: ConferenceCreate) -> Result<Conference> {
        let members = request.normalized_members();

        if !members.is_empty() {
            let found = self
                .users
                .get_users_by_ids(&members)
                .await
                .map_err(store_failed("look up conference members"))?;
            if found.len() != members.len() {
                let missing = members.iter().copied().filter(|id| !found.iter().any(|u| u.id == *id)).collect();
                return Err(MessengerError::UnknownMember { missing });
            }
        }

        let mut tx = self.conferences.begin().await.map_err(store_failed("begin conference transaction"))?;

        let conference = tx
            .insert_conference(&ConferenceCreateDBRequest {
                name: request.name,
                created_by: request.created_by,
                created_at: request.created_at,
            })
            .await
            .map_err(store_failed("insert conference"))?;

        for user_id in members {
            // Returning early drops `tx`, discarding the conference and any edges written so far
            if let Err(source) = tx.insert_member(conference.id, user_id, request.created_at).await {
                warn!(conference_id = conference.id, user_id, error = %source, "Membership insert failed, rolling back conference");
                return Err(MessengerError::MembershipCreationFailed { user_id, source });
            }
        }

        tx.commit().await.map_err(store_failed("commit conference"))?;
        Ok(conference)
    }

    /// Whether `user_id` belongs to `conference_id`. A missing conference is simply `false`.
    #[instrument(skip(self), err)]
    pub async fn verify_member(&self, user_id: UserId, conference_id: ConferenceId) -> Result<bool> {
        let conferences = self
            .conferences
            .get_conferences_by_user(user_id)
            .await
            .map_err(store_failed("list conferences for user"))?;

        Ok(conferences.iter().any(|c| c.id == conference_id))
    }

    /// [`verify_member`](Self::verify_member), turning `false` into [`MessengerError::NotMember`].
    pub async fn require_member(&self, user_id: UserId, conference_id: ConferenceId) -> Result<()> {
        if self.verify_member(user_id, conference_id).await? {
            Ok(())
        } else {
            Err(MessengerError::NotMember { user_id, conference_id })
        }
    }

    /// Store a message as given and make it the conference's `last_message`.
    ///
    /// Callers are expected to have checked membership first.
    #[instrument(skip(self, request), fields(conference_id = request.conference_id, user_id = request.user_id), err)]
    pub async fn post_message(&self, request: MessageCreate) -> Result<Message> {
        self.messages
            .insert_message(&MessageCreateDBRequest {
                conference_id: request.conference_id,
                user_id: request.user_id,
                text: request.text,
                sent_at: request.sent_at,
            })
            .await
            .map_err(store_failed("insert message"))
    }

    /// All messages of a conference, oldest first.
    #[instrument(skip(self), err)]
    pub async fn list_messages(&self, conference_id: ConferenceId) -> Result<Vec<Message>> {
        self.messages
            .get_messages_by_conference(conference_id)
            .await
            .map_err(store_failed("list messages"))
    }

    #[instrument(skip(self), err)]
    pub async fn get_user_by_id(&self, user_id: UserId) -> Result<User> {
        self.users
            .get_user_by_id(user_id)
            .await
            .map_err(store_failed("get user"))?
            .ok_or(MessengerError::UserNotFound(user_id))
    }

    #[instrument(skip(self), err)]
    pub async fn get_conferences_by_user(&self, user_id: UserId) -> Result<Vec<Conference>> {
        self.conferences
            .get_conferences_by_user(user_id)
            .await
            .map_err(store_failed("list conferences for user"))
    }

    #[instrument(skip(self), err)]
    pub async fn record_login(&self, user_id: UserId, at: DateTime<Utc>) -> Result<()> {
        match self.users.record_login(user_id, at).await {
            Ok(()) => Ok(()),
            Err(DbError::NotFound) => Err(MessengerError::UserNotFound(user_id)),
            Err(e) => Err(store_failed("record login")(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::{errors, in_memory::InMemoryStore},
        test_utils::fast_password_params,
    };
    use async_trait::async_trait;

    fn messenger() -> (Messenger, InMemoryStore) {
        let store = InMemoryStore::new();
        (Messenger::new(store.clone(), fast_password_params()), store)
    }

    async fn register(messenger: &Messenger, username: &str) -> UserId {
        messenger
            .register(username, &format!("{username}@x.com"), "pw")
            .await
            .unwrap()
            .id
    }

    fn conference(member_ids: Vec<UserId>, name: &str, created_by: UserId) -> ConferenceCreate {
        ConferenceCreate {
            member_ids,
            name: name.to_string(),
            created_by,
            created_at: Utc::now(),
            add_creator: false,
        }
    }

    #[test_log::test(tokio::test)]
    async fn test_register_hashes_password() {
        let (messenger, _) = messenger();
        let user = messenger.register("alice", "a@x.com", "pw").await.unwrap();

        assert_ne!(user.password_hash, "pw");
        assert!(password::verify_string("pw", &user.password_hash).unwrap());
    }

    #[test_log::test(tokio::test)]
    async fn test_duplicate_username_is_conflict_and_first_user_unchanged() {
        let (messenger, _) = messenger();
        let first = messenger.register("alice", "a@x.com", "pw").await.unwrap();

        let err = messenger.register("alice", "other@x.com", "pw2").await.unwrap_err();
        assert!(matches!(err, MessengerError::DuplicateUser));
        assert_eq!(err.kind(), ErrorKind::Conflict);

        let stored = messenger.get_user_by_id(first.id).await.unwrap();
        assert_eq!(stored, first);
    }

    #[test_log::test(tokio::test)]
    async fn test_duplicate_email_is_conflict() {
        let (messenger, _) = messenger();
        messenger.register("alice", "a@x.com", "pw").await.unwrap();

        let err = messenger.register("alice2", "a@x.com", "pw").await.unwrap_err();
        assert!(matches!(err, MessengerError::DuplicateUser));
    }

    #[test_log::test(tokio::test)]
    async fn test_members_of_new_conference_verify() {
        let (messenger, _) = messenger();
        let u1 = register(&messenger, "u1").await;
        let u2 = register(&messenger, "u2").await;
        let u3 = register(&messenger, "u3").await;
        let u4 = register(&messenger, "u4").await;

        let team = messenger.create_conference(conference(vec![u1, u2, u3], "Team", u1)).await.unwrap();
        assert_eq!(team.name, "Team");
        assert_eq!(team.created_by, Some(u1));

        for member in [u1, u2, u3] {
            assert!(messenger.verify_member(member, team.id).await.unwrap());
        }
        assert!(!messenger.verify_member(u4, team.id).await.unwrap());
        assert!(!messenger.verify_member(u1, team.id + 1000).await.unwrap());
    }

    #[test_log::test(tokio::test)]
    async fn test_unknown_member_writes_nothing() {
        let (messenger, store) = messenger();
        let u1 = register(&messenger, "u1").await;

        let err = messenger
            .create_conference(conference(vec![u1, 9999], "Ghosts", u1))
            .await
            .unwrap_err();

        match &err {
            MessengerError::UnknownMember { missing } => assert_eq!(missing, &vec![9999]),
            other => panic!("expected UnknownMember, got {other:?}"),
        }
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(messenger.get_conferences_by_user(u1).await.unwrap().is_empty());
        // The first conference id was never allocated
        assert!(store.get_conference(1).await.unwrap().is_none());
    }

    #[test_log::test(tokio::test)]
    async fn test_duplicate_member_ids_are_ignored() {
        let (messenger, _) = messenger();
        let u1 = register(&messenger, "u1").await;
        let u2 = register(&messenger, "u2").await;

        let conf = messenger.create_conference(conference(vec![u1, u2, u1], "Dup", u1)).await.unwrap();
        assert!(messenger.verify_member(u1, conf.id).await.unwrap());
        assert!(messenger.verify_member(u2, conf.id).await.unwrap());
    }

    #[test_log::test(tokio::test)]
    async fn test_add_creator() {
        let (messenger, _) = messenger();
        let alice = register(&messenger, "alice").await;
        let bob = register(&messenger, "bob").await;

        // Not added unless requested
        let without = messenger.create_conference(conference(vec![bob], "Without", alice)).await.unwrap();
        assert!(!messenger.verify_member(alice, without.id).await.unwrap());

        let with = messenger
            .create_conference(ConferenceCreate {
                add_creator: true,
                ..conference(vec![bob], "With", alice)
            })
            .await
            .unwrap();
        assert!(messenger.verify_member(alice, with.id).await.unwrap());

        // Already listed: added once, no duplicate-edge failure
        let listed = messenger
            .create_conference(ConferenceCreate {
                add_creator: true,
                ..conference(vec![alice, bob], "Listed", alice)
            })
            .await
            .unwrap();
        assert!(messenger.verify_member(alice, listed.id).await.unwrap());
    }

    #[test_log::test(tokio::test)]
    async fn test_empty_member_list_is_accepted() {
        let (messenger, store) = messenger();
        let alice = register(&messenger, "alice").await;

        let conf = messenger.create_conference(conference(vec![], "Empty", alice)).await.unwrap();
        assert!(store.get_conference(conf.id).await.unwrap().is_some());
        assert!(!messenger.verify_member(alice, conf.id).await.unwrap());
    }

    #[test_log::test(tokio::test)]
    async fn test_post_then_list() {
        let (messenger, _) = messenger();
        let alice = register(&messenger, "alice").await;
        let conf = messenger.create_conference(conference(vec![alice], "G", alice)).await.unwrap();

        let sent_at = Utc::now();
        let posted = messenger
            .post_message(MessageCreate {
                conference_id: conf.id,
                user_id: alice,
                text: "hello".to_string(),
                sent_at,
            })
            .await
            .unwrap();

        let listed = messenger.list_messages(conf.id).await.unwrap();
        assert_eq!(listed, vec![posted.clone()]);
        assert_eq!(posted.text, "hello");
        assert_eq!(posted.user_id, Some(alice));
        assert_eq!(posted.conference_id, conf.id);
        assert_eq!(posted.sent_at, sent_at);
    }

    #[test_log::test(tokio::test)]
    async fn test_messages_listed_oldest_first_and_last_message_tracked() {
        let (messenger, store) = messenger();
        let alice = register(&messenger, "alice").await;
        let conf = messenger.create_conference(conference(vec![alice], "G", alice)).await.unwrap();

        let now = Utc::now();
        let mut newest = None;
        for (text, offset) in [("second", 10), ("first", 0), ("third", 20)] {
            let message = messenger
                .post_message(MessageCreate {
                    conference_id: conf.id,
                    user_id: alice,
                    text: text.to_string(),
                    sent_at: now + chrono::Duration::seconds(offset),
                })
                .await
                .unwrap();
            newest = Some(message.id);
        }

        let texts: Vec<_> = messenger.list_messages(conf.id).await.unwrap().into_iter().map(|m| m.text).collect();
        assert_eq!(texts, vec!["first", "second", "third"]);

        let stored = store.get_conference(conf.id).await.unwrap().unwrap();
        assert_eq!(stored.last_message, newest);
    }

    #[test_log::test(tokio::test)]
    async fn test_alice_and_bob_scenario() {
        let (messenger, _) = messenger();
        let alice = register(&messenger, "alice").await;
        let bob = register(&messenger, "bob").await;
        assert_eq!((alice, bob), (1, 2));

        let g1 = messenger.create_conference(conference(vec![alice, bob], "G1", alice)).await.unwrap();
        assert!(messenger.verify_member(bob, g1.id).await.unwrap());

        messenger
            .post_message(MessageCreate {
                conference_id: g1.id,
                user_id: bob,
                text: "hi".to_string(),
                sent_at: Utc::now(),
            })
            .await
            .unwrap();

        let messages = messenger.list_messages(g1.id).await.unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].text, "hi");
        assert_eq!(messages[0].user_id, Some(bob));
    }

    #[test_log::test(tokio::test)]
    async fn test_require_member() {
        let (messenger, _) = messenger();
        let alice = register(&messenger, "alice").await;
        let bob = register(&messenger, "bob").await;
        let conf = messenger.create_conference(conference(vec![alice], "G", alice)).await.unwrap();

        messenger.require_member(alice, conf.id).await.unwrap();
        let err = messenger.require_member(bob, conf.id).await.unwrap_err();
        assert!(matches!(err, MessengerError::NotMember { .. }));
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
    }

    #[test_log::test(tokio::test)]
    async fn test_user_lookup_and_login_bookkeeping() {
        let (messenger, _) = messenger();
        let alice = register(&messenger, "alice").await;

        let err = messenger.get_user_by_id(alice + 1000).await.unwrap_err();
        assert!(matches!(err, MessengerError::UserNotFound(_)));
        assert_eq!(err.kind(), ErrorKind::NotFound);

        assert!(messenger.get_user_by_id(alice).await.unwrap().last_login.is_none());
        messenger.record_login(alice, Utc::now()).await.unwrap();
        assert!(messenger.get_user_by_id(alice).await.unwrap().last_login.is_some());

        assert!(matches!(
            messenger.record_login(alice + 1000, Utc::now()).await,
            Err(MessengerError::UserNotFound(_))
        ));
    }

    #[test_log::test(tokio::test)]
    async fn test_conferences_by_user_in_id_order() {
        let (messenger, _) = messenger();
        let alice = register(&messenger, "alice").await;
        let bob = register(&messenger, "bob").await;

        let a = messenger.create_conference(conference(vec![alice], "A", alice)).await.unwrap();
        messenger.create_conference(conference(vec![bob], "B", bob)).await.unwrap();
        let c = messenger.create_conference(conference(vec![alice, bob], "C", bob)).await.unwrap();

        let ids: Vec<_> = messenger.get_conferences_by_user(alice).await.unwrap().into_iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![a.id, c.id]);
    }

    /// Conference store whose transactions refuse to add one particular user.
    struct RejectMember {
        inner: InMemoryStore,
        rejected: UserId,
    }

    struct RejectMemberTransaction {
        inner: Box<dyn ConferenceTransaction>,
        rejected: UserId,
    }

    #[async_trait]
    impl ConferenceStore for RejectMember {
        async fn get_conferences_by_user(&self, user_id: UserId) -> errors::Result<Vec<Conference>> {
            self.inner.get_conferences_by_user(user_id).await
        }

        async fn get_conference(&self, id: ConferenceId) -> errors::Result<Option<Conference>> {
            self.inner.get_conference(id).await
        }

        async fn begin(&self) -> errors::Result<Box<dyn ConferenceTransaction>> {
            Ok(Box::new(RejectMemberTransaction {
                inner: self.inner.begin().await?,
                rejected: self.rejected,
            }))
        }
    }

    #[async_trait]
    impl ConferenceTransaction for RejectMemberTransaction {
        async fn insert_conference(&mut self, request: &ConferenceCreateDBRequest) -> errors::Result<Conference> {
            self.inner.insert_conference(request).await
        }

        async fn insert_member(&mut self, conference_id: ConferenceId, user_id: UserId, joined_at: DateTime<Utc>) -> errors::Result<()> {
            if user_id == self.rejected {
                return Err(DbError::Other(anyhow::anyhow!("connection reset by peer")));
            }
            self.inner.insert_member(conference_id, user_id, joined_at).await
        }

        async fn commit(self: Box<Self>) -> errors::Result<()> {
            self.inner.commit().await
        }
    }

    #[test_log::test(tokio::test)]
    async fn test_membership_failure_rolls_back_everything() {
        let store = InMemoryStore::new();
        let plain = Messenger::new(store.clone(), fast_password_params());
        let u1 = register(&plain, "u1").await;
        let u2 = register(&plain, "u2").await;
        let u3 = register(&plain, "u3").await;

        let messenger = Messenger::builder()
            .users(Arc::new(store.clone()))
            .conferences(Arc::new(RejectMember {
                inner: store.clone(),
                rejected: u3,
            }))
            .messages(Arc::new(store.clone()))
            .password_params(fast_password_params())
            .build();

        let err = messenger.create_conference(conference(vec![u1, u2, u3], "Doomed", u1)).await.unwrap_err();
        match &err {
            MessengerError::MembershipCreationFailed { user_id, .. } => assert_eq!(*user_id, u3),
            other => panic!("expected MembershipCreationFailed, got {other:?}"),
        }
        assert_eq!(err.kind(), ErrorKind::PartialFailure);

        // Neither the conference nor the edges written before the failure survive
        for user in [u1, u2, u3] {
            assert!(store.get_conferences_by_user(user).await.unwrap().is_empty());
        }
        assert!(store.get_conference(1).await.unwrap().is_none());
    }
}
