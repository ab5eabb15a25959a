//! Liveness and readiness endpoints.
//!
//! Both are unauthenticated so load balancers can reach them.

use crate::state::{AppState, Services};
use axum::{extract::State, http::StatusCode, Json};
use eventdesk_core::providers::ParticipantRepository;
use eventdesk_runtime::{HealthCheck, HealthStatus};
use serde::Serialize;

/// Liveness: the process is up.
///
/// ```text
/// GET /health  →  200 "ok"
/// ```
#[allow(clippy::unused_async)]
pub async fn health_check() -> (StatusCode, &'static str) {
    (StatusCode::OK, "ok")
}

/// Aggregated readiness report.
#[derive(Debug, Serialize)]
pub struct Readiness {
    /// Worst status across all components.
    pub status: HealthStatus,
    /// Per-component results.
    pub checks: Vec<HealthCheck>,
}

/// Readiness: both stores accept actions and the participant store answers.
///
/// Returns 200 when every component is healthy or degraded, 503 otherwise.
pub async fn readiness<D: Services>(
    State(state): State<AppState<D>>,
) -> (StatusCode, Json<Readiness>) {
    let database = match state.participants.selection_count().await {
        Ok(count) => HealthCheck::healthy("participants").with_metadata("selected", count.to_string()),
        Err(error) => HealthCheck::unhealthy("participants", error.to_string()),
    };

    let mut selection = state.selection.health();
    selection.component = "selection_store".into();
    let mut attendance = state.attendance.health();
    attendance.component = "attendance_store".into();

    let checks = vec![database, selection, attendance];
    let status = checks
        .iter()
        .fold(HealthStatus::Healthy, |worst, check| worst.worst(check.status));

    let code = if status.is_serving() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (code, Json(Readiness { status, checks }))
}
