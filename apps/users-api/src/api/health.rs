//! Readiness probe with real database/redis checks.

use crate::state::AppState;
use axum::{
    Json,
    extract::State,
    response::{IntoResponse, Response},
};
use axum_helpers::server::{HealthCheckFuture, run_health_checks};
use serde_json::json;

/// Checks PostgreSQL and Redis, and reports the event publisher's circuit
/// state.
///
/// The circuit state is informational: an open circuit means events are
/// being parked, not that the service is unavailable.
pub async fn ready_handler(State(state): State<AppState>) -> Response {
    let mut redis = state.redis.clone();

    let checks: Vec<(&str, HealthCheckFuture<'_>)> = vec![
        (
            "database",
            Box::pin(async {
                database::postgres::check_health(&state.db)
                    .await
                    .map_err(|e| format!("Database ping failed: {}", e))
            }),
        ),
        (
            "redis",
            Box::pin(async move {
                database::redis::check_health(&mut redis)
                    .await
                    .map_err(|e| format!("Redis ping failed: {}", e))
            }),
        ),
    ];

    let (status, Json(mut body)) = match run_health_checks(checks).await {
        Ok(report) => report,
        Err(report) => report,
    };
    body["event_publisher"] = json!(state.events.guard().state().to_string());

    (status, Json(body)).into_response()
}
