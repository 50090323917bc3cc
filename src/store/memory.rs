use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;

use super::{EventId, Store, StoreError, UserId};
use crate::auth::repo_types::{Credential, NewUser, User};
use crate::events::repo_types::{Event, EventChanges, NewEvent};

/// Process-local store with the same constraints as the SQL schema:
/// unique username/email, owner must exist, one registration per pair,
/// registrations removed with their event.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    last_user_id: i64,
    last_event_id: i64,
    users: BTreeMap<UserId, User>,
    events: BTreeMap<EventId, Event>,
    registrations: HashSet<(EventId, UserId)>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_user(&self, user: &NewUser) -> Result<User, StoreError> {
        let mut inner = self.inner.write().await;
        if inner.users.values().any(|u| u.username == user.username) {
            return Err(StoreError::AlreadyExists("username"));
        }
        if inner.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::AlreadyExists("email"));
        }
        inner.last_user_id += 1;
        let created = User {
            id: UserId(inner.last_user_id),
            name: user.name.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            password_hash: user.password_hash.clone(),
            created_at: OffsetDateTime::now_utc(),
        };
        inner.users.insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_credential(
        &self,
        username: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<Credential>, StoreError> {
        let inner = self.inner.read().await;
        let found = inner.users.values().find(|u| {
            username.is_some_and(|n| u.username == n) || email.is_some_and(|e| u.email == e)
        });
        Ok(found.map(|u| Credential {
            user_id: u.id,
            email: u.email.clone(),
            password_hash: u.password_hash.clone(),
        }))
    }

    async fn create_event(&self, event: &NewEvent) -> Result<Event, StoreError> {
        let mut inner = self.inner.write().await;
        if !inner.users.contains_key(&event.owner) {
            return Err(StoreError::NotFound);
        }
        inner.last_event_id += 1;
        let created = Event {
            id: EventId(inner.last_event_id),
            title: event.title.clone(),
            description: event.description.clone(),
            location: event.location.clone(),
            date_time: event.date_time,
            user_id: event.owner,
            created_at: OffsetDateTime::now_utc(),
        };
        inner.events.insert(created.id, created.clone());
        Ok(created)
    }

    async fn get_event(&self, id: EventId) -> Result<Option<Event>, StoreError> {
        Ok(self.inner.read().await.events.get(&id).cloned())
    }

    async fn list_events(&self) -> Result<Vec<Event>, StoreError> {
        Ok(self.inner.read().await.events.values().cloned().collect())
    }

    async fn update_event(
        &self,
        id: EventId,
        changes: &EventChanges,
    ) -> Result<Event, StoreError> {
        let mut inner = self.inner.write().await;
        let event = inner.events.get_mut(&id).ok_or(StoreError::NotFound)?;
        event.title = changes.title.clone();
        event.description = changes.description.clone();
        event.location = changes.location.clone();
        event.date_time = changes.date_time;
        Ok(event.clone())
    }

    async fn delete_event(&self, id: EventId) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner.events.remove(&id).ok_or(StoreError::NotFound)?;
        inner.registrations.retain(|(event, _)| *event != id);
        Ok(())
    }

    async fn set_registration(
        &self,
        event: EventId,
        user: UserId,
        registered: bool,
    ) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        if !registered {
            return Ok(inner.registrations.remove(&(event, user)));
        }
        if !inner.events.contains_key(&event) || !inner.users.contains_key(&user) {
            return Err(StoreError::NotFound);
        }
        Ok(inner.registrations.insert((event, user)))
    }
}
