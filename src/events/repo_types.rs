use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

use crate::store::{EventId, UserId};

/// Event record in the database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Event {
    pub id: EventId,
    pub title: String,
    pub description: String,
    pub location: String,
    #[serde(with = "time::serde::rfc3339")]
    pub date_time: OffsetDateTime,
    pub user_id: UserId, // owner, fixed at creation
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Event about to be inserted. The owner comes from the verified identity.
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub owner: UserId,
    pub title: String,
    pub description: String,
    pub location: String,
    pub date_time: OffsetDateTime,
}

/// Mutable event fields accepted on update.
#[derive(Debug, Clone)]
pub struct EventChanges {
    pub title: String,
    pub description: String,
    pub location: String,
    pub date_time: OffsetDateTime,
}
