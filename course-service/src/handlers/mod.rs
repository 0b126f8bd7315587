//! HTTP handlers for course-service.

pub mod auth;
pub mod courses;
pub mod payment;

use axum::{http::header, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::services;

pub async fn health_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({ "status": "ok", "service": "course-service" })),
    )
}

pub async fn metrics() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        services::render_metrics(),
    )
}
