use axum::{http::StatusCode, Json};
use serde_json::{json, Value};

use crate::app::errors::AppError;

pub async fn health() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "ok" })))
}

pub async fn not_found() -> AppError {
    AppError::not_found("route not found")
}
