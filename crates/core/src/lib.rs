//! `naslet-core` — domain foundation building blocks.
//!
//! Identifiers, the entity trait and the shared domain error. No I/O.

pub mod entity;
pub mod error;
pub mod id;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{EventId, UserId};
