//! Route definitions
//!
//! Defines all HTTP API endpoints.

use axum::{
    Router, middleware,
    routing::{get, patch, post},
};

use crate::handlers::{
    agenda, create_task, day, delete_task, health, list_tasks, login, me, register, update_task,
};
use crate::middleware::auth::require_auth;
use crate::middleware::rate_limit::rate_limit_middleware;
use crate::server::AppState;

/// Create the API router
pub fn routes(state: &AppState) -> Router<AppState> {
    // Everything here needs a bearer token
    let protected = Router::new()
        .route("/api/auth/me", get(me))
        .route("/api/tasks", get(list_tasks).post(create_task))
        .route("/api/tasks/{id}", patch(update_task).delete(delete_task))
        .route("/api/agenda", get(agenda))
        .route("/api/days/{date}", get(day))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let throttled = Router::new()
        .route("/api/auth/login", post(login))
        .route_layer(middleware::from_fn_with_state(
            state.limiter.clone(),
            rate_limit_middleware,
        ));

    Router::new()
        // Health check
        .route("/health", get(health))
        .route("/api/auth/register", post(register))
        .merge(throttled)
        .merge(protected)
}
