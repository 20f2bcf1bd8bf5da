//! Liveness endpoint.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use gridpulse_core::health::Liveness;

use crate::AppState;
use crate::models::LivenessReport;

/// `GET /livenes`: ping PostgreSQL and Redis concurrently.
///
/// Responds 200 when both answer, 500 otherwise; the body always carries
/// both statuses.
pub async fn liveness_handler(
    State(state): State<AppState>,
) -> (StatusCode, Json<LivenessReport>) {
    let report = state.prober.probe().await;
    let status = match report.liveness() {
        Liveness::Ok => StatusCode::OK,
        Liveness::Unavailable => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(report))
}
