//! In-memory store for tests/dev.
//!
//! The whole dataset sits behind one async mutex. A session holds the lock for
//! its lifetime and works on a copy; `commit` swaps the copy in. Sessions are
//! therefore fully serialized, and a dropped session leaves no trace.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};

use naslet_core::{Entity, EventId, UserId};
use naslet_events::{Event, Participation, ParticipationStatus, User};

use super::{Session, SessionProvider, StoreError, StoreResult};

#[derive(Debug, Clone, Default)]
struct Dataset {
    users: BTreeMap<UserId, User>,
    events: BTreeMap<EventId, Event>,
    participations: BTreeMap<(UserId, EventId), Participation>,
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    data: Arc<Mutex<Dataset>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a user outside of any request (fixtures, bootstrap).
    pub async fn seed_user(&self, user: User) -> StoreResult<()> {
        let mut session = self.open().await;
        session.insert_user(&user).await?;
        Box::new(session).commit().await
    }

    /// Insert a participation outside of any request (fixtures, bootstrap).
    pub async fn seed_participation(&self, participation: Participation) -> StoreResult<()> {
        let mut session = self.open().await;
        session.insert_participation(&participation).await?;
        Box::new(session).commit().await
    }

    async fn open(&self) -> InMemorySession {
        let guard = self.data.clone().lock_owned().await;
        let working = guard.clone();
        InMemorySession { guard, working }
    }
}

#[async_trait]
impl SessionProvider for InMemoryStore {
    async fn session(&self) -> StoreResult<Box<dyn Session>> {
        Ok(Box::new(self.open().await))
    }
}

pub struct InMemorySession {
    guard: OwnedMutexGuard<Dataset>,
    working: Dataset,
}

#[async_trait]
impl Session for InMemorySession {
    async fn find_user_by_identity(&mut self, identity: &str) -> StoreResult<Option<User>> {
        Ok(self
            .working
            .users
            .values()
            .find(|u| u.matches_identity(identity))
            .cloned())
    }

    async fn insert_user(&mut self, user: &User) -> StoreResult<()> {
        let clash = self.working.users.values().any(|u| {
            u.id == user.id
                || user.email.as_deref().is_some_and(|e| u.email.as_deref() == Some(e))
                || user.phone.as_deref().is_some_and(|p| u.phone.as_deref() == Some(p))
        });
        if clash {
            return Err(StoreError::Conflict(format!("user {} already exists", user.id)));
        }
        self.working.users.insert(user.id(), user.clone());
        Ok(())
    }

    async fn find_event(&mut self, id: EventId) -> StoreResult<Option<Event>> {
        Ok(self.working.events.get(&id).cloned())
    }

    async fn list_creator_events(
        &mut self,
        creator: UserId,
        only: Option<EventId>,
    ) -> StoreResult<Vec<Event>> {
        let mut events: Vec<Event> = self
            .working
            .events
            .values()
            .filter(|e| e.creator_id == creator)
            .filter(|e| only.is_none_or(|id| e.id == id))
            .cloned()
            .collect();
        events.sort_by_key(|e| (e.created_at, e.id));
        Ok(events)
    }

    async fn insert_event(&mut self, event: &Event) -> StoreResult<()> {
        if self.working.events.contains_key(&event.id) {
            return Err(StoreError::Conflict(format!("event {} already exists", event.id)));
        }
        if !self.working.users.contains_key(&event.creator_id) {
            return Err(StoreError::Database(format!(
                "event creator {} does not exist",
                event.creator_id
            )));
        }
        self.working.events.insert(event.id(), event.clone());
        Ok(())
    }

    async fn update_event(&mut self, event: &Event) -> StoreResult<bool> {
        match self.working.events.get_mut(&event.id) {
            Some(stored) => {
                stored.name = event.name.clone();
                stored.description = event.description.clone();
                stored.date = event.date;
                stored.location = event.location.clone();
                stored.price = event.price;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_event(&mut self, id: EventId) -> StoreResult<bool> {
        if self.working.events.remove(&id).is_none() {
            return Ok(false);
        }
        self.working
            .participations
            .retain(|(_, event_id), _| *event_id != id);
        Ok(true)
    }

    async fn list_participants(&mut self, event: EventId) -> StoreResult<Vec<(User, Participation)>> {
        let mut rows = Vec::new();
        for p in self.working.participations.values().filter(|p| p.event_id == event) {
            let user = self.working.users.get(&p.user_id).cloned().ok_or_else(|| {
                StoreError::Corrupt(format!("participation references missing user {}", p.user_id))
            })?;
            rows.push((user, p.clone()));
        }
        rows.sort_by_key(|(u, p)| (p.joined_at, u.id));
        Ok(rows)
    }

    async fn find_participation(
        &mut self,
        user: UserId,
        event: EventId,
    ) -> StoreResult<Option<Participation>> {
        Ok(self.working.participations.get(&(user, event)).cloned())
    }

    async fn insert_participation(&mut self, participation: &Participation) -> StoreResult<()> {
        let key = (participation.user_id, participation.event_id);
        if !self.working.users.contains_key(&key.0) || !self.working.events.contains_key(&key.1) {
            return Err(StoreError::Database(
                "participation references a missing user or event".to_string(),
            ));
        }
        if self.working.participations.contains_key(&key) {
            return Err(StoreError::Conflict("participation already exists".to_string()));
        }
        self.working.participations.insert(key, participation.clone());
        Ok(())
    }

    async fn set_participation_status(
        &mut self,
        user: UserId,
        event: EventId,
        status: ParticipationStatus,
    ) -> StoreResult<bool> {
        match self.working.participations.get_mut(&(user, event)) {
            Some(p) => {
                p.status = status;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_participation(&mut self, user: UserId, event: EventId) -> StoreResult<bool> {
        Ok(self.working.participations.remove(&(user, event)).is_some())
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        let InMemorySession { mut guard, working } = *self;
        *guard = working;
        Ok(())
    }
}
