//! Consistent error responses.
//!
//! Every failure leaving a handler is an [`AppError`]. It renders as
//! `{"code": <status>, "message": <text>}` and leaves an [`ExceptionRecord`]
//! in the response extensions for the request logger.

use std::any::Any;

use axum::extract::rejection::{FormRejection, JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use naslet_auth::{PasswordError, TokenError};
use naslet_core::DomainError;
use naslet_infra::StoreError;
use naslet_observability::ExceptionRecord;

use crate::app::services::ServiceError;

pub const INTERNAL_MESSAGE: &str = "Internal server error";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("method not allowed")]
    MethodNotAllowed,

    /// Anything unclassified. The cause is logged, never returned.
    #[error("Internal server error")]
    Internal { cause: String },
}

/// Wire shape of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: u16,
    pub message: String,
}

impl AppError {
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn internal(cause: impl std::fmt::Display) -> Self {
        Self::Internal {
            cause: cause.to_string(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn record(&self) -> ExceptionRecord {
        ExceptionRecord {
            code: self.status().as_u16(),
            message: self.to_string(),
            cause: match self {
                AppError::Internal { cause } => Some(cause.clone()),
                _ => None,
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let record = self.record();
        let body = ErrorBody {
            code: record.code,
            message: record.message.clone(),
        };

        let mut response = (status, Json(body)).into_response();
        response.extensions_mut().insert(record);
        response
    }
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(_) | DomainError::InvalidId(_) => {
                AppError::Validation(err.to_string())
            }
            DomainError::NotFound(_) => AppError::NotFound(err.to_string()),
            DomainError::Forbidden(_) => AppError::Forbidden(err.to_string()),
            DomainError::Unauthorized(_) => AppError::Unauthorized(err.to_string()),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::internal(err)
    }
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Signing(_) => AppError::internal(err),
            other => AppError::Unauthorized(other.to_string()),
        }
    }
}

impl From<PasswordError> for AppError {
    fn from(err: PasswordError) -> Self {
        AppError::internal(err)
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Domain(e) => e.into(),
            ServiceError::Store(e) => e.into(),
            ServiceError::Token(e) => e.into(),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<FormRejection> for AppError {
    fn from(rejection: FormRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

/// Turn a caught handler panic into the generic 500 response.
pub fn panic_to_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let cause = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "handler panicked".to_string()
    };
    AppError::internal(format!("panic: {cause}")).into_response()
}
