use tracing::warn;

use super::repo_types::Event;
use crate::{error::AppError, store::UserId};

/// Only the owner of an event may change or delete it.
pub fn authorize_mutation(verified: UserId, event: &Event) -> Result<(), AppError> {
    if event.user_id == verified {
        return Ok(());
    }
    warn!(
        user_id = %verified,
        event_id = %event.id,
        owner_id = %event.user_id,
        "mutation denied: not the owner"
    );
    Err(AppError::Forbidden)
}
