use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{
        header::{ALLOW, AUTHORIZATION},
        Request, StatusCode,
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::Local;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};

use naslet_auth::TokenCodec;
use naslet_observability::{ExceptionRecord, Logger};

use crate::app::errors::AppError;
use crate::context::IdentityContext;

const CTIME_FORMAT: &str = "%a %b %e %H:%M:%S %Y";

/// Validate the bearer token and attach the caller's [`IdentityContext`].
pub async fn auth_middleware(
    State(tokens): State<Arc<TokenCodec>>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    let identity = tokens.get_user_identity(header)?;
    req.extensions_mut().insert(IdentityContext::new(identity));

    Ok(next.run(req).await)
}

/// Log every request at start and completion, plus any exception the
/// response carries.
pub async fn log_requests(
    State(logger): State<Logger>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let method = req.method().to_string();
    let path = req.uri().path().to_string();
    let host = client_host(&req);
    let timestamp = Local::now().format(CTIME_FORMAT).to_string();

    logger.log_request_start(&method, &path, &timestamp, &host);
    let started = Instant::now();

    let response = next.run(req).await;

    if let Some(record) = response.extensions().get::<ExceptionRecord>() {
        logger.log_exception(record);
    }
    let finished_at = Local::now().format(CTIME_FORMAT).to_string();
    logger.log_request_end(&method, &path, &finished_at, started.elapsed(), &host);

    response
}

/// Give the router's bare 405 the standard error body, keeping `Allow`.
pub async fn method_not_allowed_as_error(response: Response) -> Response {
    if response.status() != StatusCode::METHOD_NOT_ALLOWED
        || response.extensions().get::<ExceptionRecord>().is_some()
    {
        return response;
    }
    let allow = response.headers().get(ALLOW).cloned();
    let mut mapped = AppError::MethodNotAllowed.into_response();
    if let Some(allow) = allow {
        mapped.headers_mut().insert(ALLOW, allow);
    }
    mapped
}

fn client_host(req: &Request<Body>) -> String {
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Any origin, method and header; credentials allowed. Origins are mirrored
/// since a wildcard cannot be combined with credentials.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}
