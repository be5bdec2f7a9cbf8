//! Data persistence and access.
//!
//! The storage layer is split in three:
//!
//! ```text
//! ┌──────────────┐
//! │  Messenger   │  (crate::messenger - domain rules)
//! └──────┬───────┘
//!        │  stores::{UserStore, ConferenceStore, MessageStore}
//!        ↓
//! ┌──────────────┐      ┌───────────────┐
//! │ PostgresStore│      │ InMemoryStore │
//! └──────┬───────┘      └───────────────┘
//!        │
//!        ↓
//! ┌──────────────┐
//! │ Repositories │  (db::handlers - SQL queries)
//! └──────┬───────┘
//!        ↓
//! ┌──────────────┐
//! │  PostgreSQL  │
//! └──────────────┘
//! ```
//!
//! # Modules
//!
//! - [`stores`]: Capability traits the core is written against
//! - [`postgres`]: PostgreSQL backend built on the [`handlers`] repositories
//! - [`in_memory`]: Process-local backend for tests and single-node runs
//! - [`models`]: Record structures matching table schemas
//! - [`errors`]: Store error classification
//!
//! # Repositories and transactions
//!
//! Repositories borrow a connection, so they run equally well against a pooled
//! connection or an open transaction:
//!
//! ```ignore
//! let mut tx = pool.begin().await?;
//! let conference = Conferences::new(&mut tx).create(&request).await?;
//! Conferences::new(&mut tx).add_member(conference.id, user_id, now).await?;
//! tx.commit().await?;
//! ```
//!
//! # Migrations
//!
//! Schema migrations live in `migrations/` and are embedded through
//! [`crate::migrator`].

pub mod errors;
pub mod handlers;
pub mod in_memory;
pub mod models;
pub mod postgres;
pub mod stores;
