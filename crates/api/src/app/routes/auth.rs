use axum::{extract::rejection::FormRejection, Extension, Form, Json};

use crate::app::{
    dto::{TokenIn, TokenOut},
    errors::AppError,
    services, AppState,
};

/// `POST /token`: OAuth2 password flow.
pub async fn login(
    Extension(state): Extension<AppState>,
    form: Result<Form<TokenIn>, FormRejection>,
) -> Result<Json<TokenOut>, AppError> {
    let Form(form) = form?;
    let mut session = state.store.session().await?;
    let token =
        services::authenticate(&form.username, &form.password, &state.tokens, session.as_mut())
            .await?;
    Ok(Json(TokenOut::bearer(token)))
}
