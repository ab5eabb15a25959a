//! HTTP request handlers, one module per area of the dashboard.

use crate::error::AppError;
use axum::extract::rejection::JsonRejection;
use axum::Json;

pub mod attendance;
pub mod certificates;
pub mod health;
pub mod live;
pub mod mail;
pub mod participants;
pub mod selection;

pub use health::{health_check, readiness};

/// Unwrap a JSON body, turning decode failures into a 400 with axum's reason.
pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| AppError::bad_request(rejection.body_text()))
}
