//! Storage abstraction for evbook.
//!
//! Handlers and the registration state machine only talk to [`Store`]; the
//! PostgreSQL and in-memory backends own uniqueness and concurrency control.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::auth::repo_types::{Credential, NewUser, User};
use crate::events::repo_types::{Event, EventChanges, NewEvent};

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Uniform error type for all storage backends.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found")]
    NotFound,
    #[error("{0} already exists")]
    AlreadyExists(&'static str),
    #[error("backend error: {0}")]
    Backend(String),
}

/// Storage-assigned user identifier.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type,
)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct UserId(pub i64);

/// Storage-assigned event identifier.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type,
)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct EventId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[async_trait]
pub trait Store: Send + Sync {
    // ───────────────────────────── Users ─────────────────────────────

    /// Insert a user; the id and creation time are assigned by the backend.
    async fn create_user(&self, user: &NewUser) -> Result<User, StoreError>;

    /// Look up login material by username or email (either may be absent).
    async fn find_credential(
        &self,
        username: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<Credential>, StoreError>;

    // ───────────────────────────── Events ────────────────────────────

    async fn create_event(&self, event: &NewEvent) -> Result<Event, StoreError>;

    async fn get_event(&self, id: EventId) -> Result<Option<Event>, StoreError>;

    /// All events ordered by id.
    async fn list_events(&self) -> Result<Vec<Event>, StoreError>;

    /// Overwrite the mutable fields of an event. Owner and id never change.
    async fn update_event(&self, id: EventId, changes: &EventChanges)
        -> Result<Event, StoreError>;

    async fn delete_event(&self, id: EventId) -> Result<(), StoreError>;

    // ────────────────────────── Registrations ────────────────────────

    /// Set whether `user` is registered for `event`.
    /// Returns `true` if the stored state changed.
    async fn set_registration(
        &self,
        event: EventId,
        user: UserId,
        registered: bool,
    ) -> Result<bool, StoreError>;
}
