//! Persistence: scoped sessions over the relational store.
//!
//! A [`Session`] is one unit of work (one transaction). It is opened per
//! request by a [`SessionProvider`], and either committed or dropped. Dropping
//! an uncommitted session discards everything it did.

use async_trait::async_trait;
use thiserror::Error;

use naslet_core::{EventId, UserId};
use naslet_events::{Event, Participation, ParticipationStatus, User};

pub mod memory;
pub mod postgres;

pub use memory::{InMemorySession, InMemoryStore};
pub use postgres::{PostgresSession, PostgresStore};

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write.
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("database error: {0}")]
    Database(String),

    /// A stored row could not be mapped back to a domain value.
    #[error("corrupt row: {0}")]
    Corrupt(String),
}

/// Opens scoped sessions. Shared by every request.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    async fn session(&self) -> StoreResult<Box<dyn Session>>;
}

/// A unit of work against the store.
#[async_trait]
pub trait Session: Send {
    /// Find the user whose email or phone equals `identity`.
    async fn find_user_by_identity(&mut self, identity: &str) -> StoreResult<Option<User>>;

    async fn insert_user(&mut self, user: &User) -> StoreResult<()>;

    async fn find_event(&mut self, id: EventId) -> StoreResult<Option<Event>>;

    /// Events created by `creator`, oldest first, optionally narrowed to one id.
    async fn list_creator_events(
        &mut self,
        creator: UserId,
        only: Option<EventId>,
    ) -> StoreResult<Vec<Event>>;

    async fn insert_event(&mut self, event: &Event) -> StoreResult<()>;

    /// Overwrite the mutable columns of an existing event. `false` if absent.
    async fn update_event(&mut self, event: &Event) -> StoreResult<bool>;

    /// Remove an event and every participation on it. `false` if absent.
    async fn delete_event(&mut self, id: EventId) -> StoreResult<bool>;

    /// Participants of an event with their participation, by join time.
    async fn list_participants(&mut self, event: EventId) -> StoreResult<Vec<(User, Participation)>>;

    async fn find_participation(
        &mut self,
        user: UserId,
        event: EventId,
    ) -> StoreResult<Option<Participation>>;

    async fn insert_participation(&mut self, participation: &Participation) -> StoreResult<()>;

    /// `false` if there is no such participation.
    async fn set_participation_status(
        &mut self,
        user: UserId,
        event: EventId,
        status: ParticipationStatus,
    ) -> StoreResult<bool>;

    /// `false` if there is no such participation.
    async fn delete_participation(&mut self, user: UserId, event: EventId) -> StoreResult<bool>;

    async fn commit(self: Box<Self>) -> StoreResult<()>;
}
