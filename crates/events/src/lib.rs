//! `naslet-events` — event-management domain model.
//!
//! Users create events and manage the participations other users hold on
//! them. Everything here is pure data + validation; persistence and HTTP
//! live in `naslet-infra` and `naslet-api`.

pub mod event;
pub mod participation;
pub mod user;

pub use event::{Event, EventDetails};
pub use participation::{Participation, ParticipationStatus};
pub use user::User;
