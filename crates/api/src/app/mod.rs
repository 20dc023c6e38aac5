//! HTTP API application wiring (Axum router + shared state).
//!
//! - `services.rs`: the business operations, one per endpoint
//! - `routes/`: HTTP routes + handlers
//! - `dto.rs`: request/response DTOs
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{
    middleware::{from_fn_with_state, map_response},
    routing::{get, post},
    Extension, Router,
};
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;

use naslet_auth::TokenCodec;
use naslet_infra::SessionProvider;
use naslet_observability::Logger;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Shared per-process state, reachable from every request via extensions.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn SessionProvider>,
    pub tokens: Arc<TokenCodec>,
    pub logger: Logger,
}

impl AppState {
    pub fn new(store: Arc<dyn SessionProvider>, tokens: TokenCodec, logger: Logger) -> Self {
        Self {
            store,
            tokens: Arc::new(tokens),
            logger,
        }
    }
}

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(state: AppState) -> Router {
    // Protected routes: require a valid bearer token.
    let protected = routes::router().layer(from_fn_with_state(
        state.tokens.clone(),
        middleware::auth_middleware,
    ));

    Router::new()
        .route("/health", get(routes::system::health))
        .route("/token", post(routes::auth::login))
        .merge(protected)
        .fallback(routes::system::not_found)
        .layer(Extension(state.clone()))
        .layer(
            ServiceBuilder::new()
                .layer(from_fn_with_state(state.logger, middleware::log_requests))
                .layer(middleware::cors_layer())
                .layer(CatchPanicLayer::custom(errors::panic_to_response))
                .layer(map_response(middleware::method_not_allowed_as_error)),
        )
}
