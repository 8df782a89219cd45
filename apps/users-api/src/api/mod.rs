use axum::{Router, routing::get};

use crate::state::AppState;

pub mod health;
pub mod users;

/// Routes nested under `/api` by `create_router`
pub fn routes(state: &AppState) -> Router {
    Router::new().nest("/users", users::router(state))
}

/// `/ready` with real dependency checks
pub fn ready_router(state: AppState) -> Router {
    Router::new()
        .route("/ready", get(health::ready_handler))
        .with_state(state)
}
