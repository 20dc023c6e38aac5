use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use naslet_core::{EventId, UserId};
use naslet_events::{Event, EventDetails, Participation, ParticipationStatus, User};

// -------------------------
// Request DTOs
// -------------------------

/// `?id=<event>` on event-scoped routes.
#[derive(Debug, Deserialize)]
pub struct EventSelector {
    pub id: EventId,
}

/// Optional `?id=<event>` filter on listings.
#[derive(Debug, Default, Deserialize)]
pub struct EventFilter {
    #[serde(default)]
    pub id: Option<EventId>,
}

/// Full event object sent back for an update. Creator and creation time are
/// accepted (so a listed event can be echoed back) but never applied.
#[derive(Debug, Deserialize)]
pub struct EventUpdate {
    pub id: EventId,
    #[serde(flatten)]
    pub details: EventDetails,
}

#[derive(Debug, Deserialize)]
pub struct UserEvent {
    #[serde(alias = "user")]
    pub user_id: UserId,
    #[serde(alias = "event")]
    pub event_id: EventId,
    pub status: ParticipationStatus,
}

#[derive(Debug, Deserialize)]
pub struct UserEventKick {
    #[serde(alias = "user")]
    pub user_id: UserId,
    #[serde(alias = "event")]
    pub event_id: EventId,
}

/// OAuth2 password-flow form.
#[derive(Debug, Deserialize)]
pub struct TokenIn {
    pub username: String,
    pub password: String,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct SuccessfulResponse {
    pub success: bool,
}

impl SuccessfulResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

#[derive(Debug, Serialize)]
pub struct TokenOut {
    pub access_token: String,
    pub token_type: &'static str,
}

impl TokenOut {
    pub fn bearer(access_token: String) -> Self {
        Self { access_token, token_type: "bearer" }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventOut {
    pub id: EventId,
    pub creator_id: UserId,
    pub name: String,
    pub description: Option<String>,
    pub date: NaiveDate,
    pub location: Option<String>,
    pub price: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl From<Event> for EventOut {
    fn from(e: Event) -> Self {
        Self {
            id: e.id,
            creator_id: e.creator_id,
            name: e.name,
            description: e.description,
            date: e.date,
            location: e.location,
            price: e.price,
            created_at: e.created_at,
        }
    }
}

/// Public view of a user; the password hash never leaves the service.
#[derive(Debug, Serialize)]
pub struct UserOut {
    pub id: UserId,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub name: String,
}

impl From<User> for UserOut {
    fn from(u: User) -> Self {
        Self { id: u.id, email: u.email, phone: u.phone, name: u.name }
    }
}

#[derive(Debug, Serialize)]
pub struct ParticipationOut {
    pub user_id: UserId,
    pub event_id: EventId,
    pub status: ParticipationStatus,
    pub joined_at: DateTime<Utc>,
}

impl From<Participation> for ParticipationOut {
    fn from(p: Participation) -> Self {
        Self { user_id: p.user_id, event_id: p.event_id, status: p.status, joined_at: p.joined_at }
    }
}

#[derive(Debug, Serialize)]
pub struct UserParticipation {
    pub user: UserOut,
    pub participation: ParticipationOut,
}

impl From<(User, Participation)> for UserParticipation {
    fn from((user, participation): (User, Participation)) -> Self {
        Self { user: user.into(), participation: participation.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listed_event_can_be_sent_back_as_update() {
        let creator = User {
            id: UserId::new(),
            email: Some("c@example.com".into()),
            phone: None,
            name: "C".into(),
            password_hash: String::new(),
        };
        let details = EventDetails {
            name: "Launch".into(),
            description: Some("rooftop".into()),
            date: NaiveDate::from_ymd_opt(2025, 3, 14).unwrap(),
            location: Some("Berlin".into()),
            price: Some(1500),
        };
        let event = Event::create(&creator, details.clone(), Utc::now()).unwrap();

        let json = serde_json::to_value(EventOut::from(event.clone())).unwrap();
        let update: EventUpdate = serde_json::from_value(json).unwrap();

        assert_eq!(update.id, event.id);
        assert_eq!(update.details, details);
    }

    #[test]
    fn participation_payload_accepts_short_field_names() {
        let user = UserId::new();
        let event = EventId::new();
        let body = serde_json::json!({"user": user, "event": event, "status": "approved"});
        let parsed: UserEvent = serde_json::from_value(body).unwrap();
        assert_eq!(parsed.user_id, user);
        assert_eq!(parsed.event_id, event);
        assert_eq!(parsed.status, ParticipationStatus::Approved);
    }

    #[test]
    fn user_view_hides_password_hash() {
        let user = User {
            id: UserId::new(),
            email: None,
            phone: Some("+100".into()),
            name: "P".into(),
            password_hash: "secret-hash".into(),
        };
        let json = serde_json::to_string(&UserOut::from(user)).unwrap();
        assert!(!json.contains("secret-hash"));
        assert!(!json.contains("password"));
    }
}
