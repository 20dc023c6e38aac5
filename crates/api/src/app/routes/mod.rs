use axum::{
    routing::{get, post, put},
    Router,
};

pub mod auth;
pub mod events;
pub mod system;

/// Router for all authenticated endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/event", post(events::create_event).delete(events::delete_event))
        .route("/event/users", get(events::get_event_users))
        .route("/user/event", put(events::update_event))
        .route("/user/event/status", put(events::change_participation_status))
        .route("/user/event/kick", post(events::kick_user))
        .route("/user/events", get(events::get_user_events))
}
