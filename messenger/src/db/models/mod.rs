//! Record models matching table schemas.
//!
//! Request structs (`*CreateDBRequest`) carry what a caller supplies for an insert.
//! Response structs (`*DBResponse`) derive `sqlx::FromRow` and mirror a stored row.
//! They are kept separate from [`crate::api::models`] so the storage shape and the
//! wire shape can change independently; notably the wire shape never carries the
//! password digest.

pub mod conferences;
pub mod messages;
pub mod users;
