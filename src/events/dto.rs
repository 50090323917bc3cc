use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::repo_types::{Event, EventChanges, NewEvent};
use crate::error::AppError;
use crate::payload::{require, Validate};
use crate::store::UserId;

/// Event attributes sent by the client on create and update.
///
/// `id` and `user_id` are accepted so that clients echoing a full event do
/// not fail to bind, but they are never trusted.
#[derive(Debug, Deserialize)]
pub struct EventPayload {
    pub title: String,
    pub description: String,
    pub location: String,
    #[serde(with = "time::serde::rfc3339")]
    pub date_time: OffsetDateTime,
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub user_id: Option<i64>,
}

impl Validate for EventPayload {
    fn validate(&self) -> Result<(), AppError> {
        require("title", &self.title)?;
        require("description", &self.description)?;
        require("location", &self.location)?;
        Ok(())
    }
}

impl EventPayload {
    pub fn into_new_event(self, owner: UserId) -> NewEvent {
        NewEvent {
            owner,
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            location: self.location.trim().to_string(),
            date_time: self.date_time,
        }
    }

    pub fn into_changes(self) -> EventChanges {
        EventChanges {
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            location: self.location.trim().to_string(),
            date_time: self.date_time,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct EventResponse {
    pub message: &'static str,
    pub event: Event,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}
