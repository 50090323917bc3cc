//! Registration of users for events.
//!
//! Each (event, user) pair is either registered or not. Both transitions
//! are idempotent: registering twice keeps a single registration and
//! cancelling an absent one succeeds. The acting user is always the
//! verified caller.

use tracing::info;

use super::repo_types::Event;
use crate::{
    error::AppError,
    store::{EventId, Store, UserId},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationState {
    NotRegistered,
    Registered,
}

#[derive(Debug, Clone)]
pub struct RegistrationOutcome {
    pub event: Event,
    pub state: RegistrationState,
    /// False when the pair was already in the requested state.
    pub changed: bool,
}

pub async fn register(
    store: &dyn Store,
    event_id: EventId,
    user: UserId,
) -> Result<RegistrationOutcome, AppError> {
    transition(store, event_id, user, RegistrationState::Registered).await
}

pub async fn cancel(
    store: &dyn Store,
    event_id: EventId,
    user: UserId,
) -> Result<RegistrationOutcome, AppError> {
    transition(store, event_id, user, RegistrationState::NotRegistered).await
}

async fn transition(
    store: &dyn Store,
    event_id: EventId,
    user: UserId,
    target: RegistrationState,
) -> Result<RegistrationOutcome, AppError> {
    let event = store
        .get_event(event_id)
        .await?
        .ok_or(AppError::NotFound("event"))?;

    let changed = store
        .set_registration(event_id, user, target == RegistrationState::Registered)
        .await
        .map_err(|e| AppError::from_store(e, "event"))?;

    info!(%event_id, user_id = %user, state = ?target, changed, "registration updated");
    Ok(RegistrationOutcome {
        event,
        state: target,
        changed,
    })
}
