//! Domain services: the business operations behind each endpoint.
//!
//! Every operation takes the acting user and the request's session, and
//! re-checks ownership against what the session actually holds. A forged event
//! id therefore never reaches another creator's data.

use chrono::Utc;
use thiserror::Error;

use naslet_auth::{Identity, TokenCodec, TokenError, verify_password};
use naslet_core::{DomainError, EventId, UserId};
use naslet_events::{Event, EventDetails, Participation, ParticipationStatus, User};
use naslet_infra::{Session, StoreError};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Token(#[from] TokenError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Resolve the acting user from a token identity (email or phone).
pub async fn get_user_by_email_or_phone(
    identity: &Identity,
    session: &mut dyn Session,
) -> ServiceResult<User> {
    session
        .find_user_by_identity(identity.as_str())
        .await?
        .ok_or_else(|| DomainError::unauthorized("user for this token no longer exists").into())
}

/// Check credentials and issue an access token for the user.
pub async fn authenticate(
    username: &str,
    password: &str,
    tokens: &TokenCodec,
    session: &mut dyn Session,
) -> ServiceResult<String> {
    let rejected = || DomainError::unauthorized("incorrect username or password");

    let user = session
        .find_user_by_identity(username)
        .await?
        .ok_or_else(rejected)?;
    if !verify_password(password, &user.password_hash) {
        return Err(rejected().into());
    }

    let token = tokens.create_access_token(&Identity::new(username))?;
    tracing::info!(user_id = %user.id, "issued access token");
    Ok(token)
}

/// The event `event_id`, provided `user` created it.
pub async fn get_user_event(
    user: &User,
    event_id: EventId,
    session: &mut dyn Session,
) -> ServiceResult<Event> {
    let event = session
        .find_event(event_id)
        .await?
        .ok_or_else(|| DomainError::not_found("event"))?;

    if !event.is_owned_by(user) {
        tracing::warn!(user_id = %user.id, event_id = %event_id, "ownership check failed");
        return Err(DomainError::forbidden("event belongs to another user").into());
    }
    Ok(event)
}

/// Participants of an owned event, in join order.
pub async fn get_event_users(
    user: &User,
    event_id: EventId,
    session: &mut dyn Session,
) -> ServiceResult<Vec<(User, Participation)>> {
    let event = get_user_event(user, event_id, session).await?;
    Ok(session.list_participants(event.id).await?)
}

/// Events created by `user`, oldest first, optionally only `event_id`.
pub async fn get_user_events(
    user: &User,
    event_id: Option<EventId>,
    session: &mut dyn Session,
) -> ServiceResult<Vec<Event>> {
    Ok(session.list_creator_events(user.id, event_id).await?)
}

pub async fn create_new_event(
    user: &User,
    details: EventDetails,
    session: &mut dyn Session,
) -> ServiceResult<Event> {
    let event = Event::create(user, details, Utc::now())?;
    session.insert_event(&event).await?;
    tracing::info!(user_id = %user.id, event_id = %event.id, "event created");
    Ok(event)
}

/// Delete an owned event together with its participations.
pub async fn delete_event(
    user: &User,
    event_id: EventId,
    session: &mut dyn Session,
) -> ServiceResult<()> {
    let event = get_user_event(user, event_id, session).await?;
    if !session.delete_event(event.id).await? {
        return Err(DomainError::not_found("event").into());
    }
    tracing::info!(user_id = %user.id, event_id = %event.id, "event deleted");
    Ok(())
}

/// Overwrite the mutable fields of an owned event.
pub async fn update_event(
    user: &User,
    event_id: EventId,
    details: EventDetails,
    session: &mut dyn Session,
) -> ServiceResult<Event> {
    let mut event = get_user_event(user, event_id, session).await?;
    event.apply_details(details)?;
    if !session.update_event(&event).await? {
        return Err(DomainError::not_found("event").into());
    }
    tracing::info!(user_id = %user.id, event_id = %event.id, "event updated");
    Ok(event)
}

pub async fn change_participation_status(
    user: &User,
    participant: UserId,
    event_id: EventId,
    status: ParticipationStatus,
    session: &mut dyn Session,
) -> ServiceResult<()> {
    let event = get_user_event(user, event_id, session).await?;
    if !session
        .set_participation_status(participant, event.id, status)
        .await?
    {
        return Err(DomainError::not_found("participation").into());
    }
    tracing::info!(
        event_id = %event.id,
        participant = %participant,
        status = %status,
        "participation status changed"
    );
    Ok(())
}

pub async fn kick_user_from_participation(
    user: &User,
    participant: UserId,
    event_id: EventId,
    session: &mut dyn Session,
) -> ServiceResult<()> {
    let event = get_user_event(user, event_id, session).await?;
    if !session.delete_participation(participant, event.id).await? {
        return Err(DomainError::not_found("participation").into());
    }
    tracing::info!(event_id = %event.id, participant = %participant, "participant kicked");
    Ok(())
}
