//! Event and participation management for the event's creator.
//!
//! Each handler resolves the caller through [`CreatorContext`], makes one
//! service call, and commits the session before answering.

use axum::{
    body::Bytes,
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query,
    },
    http::{header::CONTENT_TYPE, HeaderMap},
    Json,
};
use naslet_events::EventDetails;

use crate::app::{
    dto::{
        EventFilter, EventOut, EventSelector, EventUpdate, SuccessfulResponse, UserEvent,
        UserEventKick, UserParticipation,
    },
    errors::AppError,
    services,
};
use crate::context::CreatorContext;

type Ack = Result<Json<SuccessfulResponse>, AppError>;

pub async fn get_event_users(
    mut ctx: CreatorContext,
    query: Result<Query<EventSelector>, QueryRejection>,
) -> Result<Json<Vec<UserParticipation>>, AppError> {
    let Query(selector) = query?;
    let (user, session) = ctx.split();
    let rows = services::get_event_users(user, selector.id, session).await?;
    ctx.commit().await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

/// `POST /event`: fields come from the query string, or from a JSON body
/// when the request says it is sending one.
pub async fn create_event(
    mut ctx: CreatorContext,
    query: Result<Query<EventDetails>, QueryRejection>,
    headers: HeaderMap,
    body: Bytes,
) -> Ack {
    let details = if is_json(&headers) {
        let Json(details) = Json::<EventDetails>::from_bytes(&body)?;
        details
    } else {
        let Query(details) = query?;
        details
    };
    let (user, session) = ctx.split();
    services::create_new_event(user, details, session).await?;
    ctx.commit().await?;
    Ok(Json(SuccessfulResponse::ok()))
}

pub async fn delete_event(
    mut ctx: CreatorContext,
    query: Result<Query<EventSelector>, QueryRejection>,
) -> Ack {
    let Query(selector) = query?;
    let (user, session) = ctx.split();
    services::delete_event(user, selector.id, session).await?;
    ctx.commit().await?;
    Ok(Json(SuccessfulResponse::ok()))
}

pub async fn update_event(
    mut ctx: CreatorContext,
    payload: Result<Json<EventUpdate>, JsonRejection>,
) -> Ack {
    let Json(update) = payload?;
    let (user, session) = ctx.split();
    services::update_event(user, update.id, update.details, session).await?;
    ctx.commit().await?;
    Ok(Json(SuccessfulResponse::ok()))
}

pub async fn change_participation_status(
    mut ctx: CreatorContext,
    payload: Result<Json<UserEvent>, JsonRejection>,
) -> Ack {
    let Json(change) = payload?;
    let (user, session) = ctx.split();
    services::change_participation_status(
        user,
        change.user_id,
        change.event_id,
        change.status,
        session,
    )
    .await?;
    ctx.commit().await?;
    Ok(Json(SuccessfulResponse::ok()))
}

pub async fn kick_user(
    mut ctx: CreatorContext,
    payload: Result<Json<UserEventKick>, JsonRejection>,
) -> Ack {
    let Json(kick) = payload?;
    let (user, session) = ctx.split();
    services::kick_user_from_participation(user, kick.user_id, kick.event_id, session).await?;
    ctx.commit().await?;
    Ok(Json(SuccessfulResponse::ok()))
}

pub async fn get_user_events(
    mut ctx: CreatorContext,
    query: Result<Query<EventFilter>, QueryRejection>,
) -> Result<Json<Vec<EventOut>>, AppError> {
    let Query(filter) = query?;
    let (user, session) = ctx.split();
    let events = services::get_user_events(user, filter.id, session).await?;
    ctx.commit().await?;
    Ok(Json(events.into_iter().map(EventOut::from).collect()))
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|ct| ct.trim_start().starts_with("application/json"))
}
