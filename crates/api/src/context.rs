use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use naslet_auth::Identity;
use naslet_events::User;
use naslet_infra::Session;

use crate::app::{errors::AppError, services, AppState};

/// Identity taken from a validated bearer token.
///
/// Inserted by the auth middleware; present on every protected route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityContext {
    identity: Identity,
}

impl IdentityContext {
    pub fn new(identity: Identity) -> Self {
        Self { identity }
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }
}

/// Request-scoped context for protected routes: an open session and the
/// user the token resolves to within it.
///
/// Built once per request. Dropping it without [`CreatorContext::commit`]
/// rolls the session back.
pub struct CreatorContext {
    user: User,
    session: Box<dyn Session>,
}

impl CreatorContext {
    pub fn split(&mut self) -> (&User, &mut dyn Session) {
        (&self.user, self.session.as_mut())
    }

    pub async fn commit(self) -> Result<(), AppError> {
        self.session.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CreatorContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let identity = parts
            .extensions
            .get::<IdentityContext>()
            .cloned()
            .ok_or_else(|| AppError::unauthorized("missing credentials"))?;
        let state = parts
            .extensions
            .get::<AppState>()
            .cloned()
            .ok_or_else(|| AppError::internal("application state not installed"))?;

        let mut session = state.store.session().await?;
        let user = services::get_user_by_email_or_phone(identity.identity(), session.as_mut()).await?;

        Ok(Self { user, session })
    }
}
