//! HTTP API handlers
//!
//! Account, task and planner endpoints.

use axum::{
    Extension, Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use dayline_core::validate::parse_date;
use dayline_core::{
    Identity, LoginGrant, PatchDraft, TaskDraft, TaskRecord, UserProfile, agenda_page, day_view,
};

use crate::error::{ApiError, Result};
use crate::server::AppState;

// ============================================================================
// Request/Response types
// ============================================================================

/// Registration payload
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub login: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
}

/// Login payload
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub login: Option<String>,
    pub password: Option<String>,
}

/// Current user response
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: UserProfile,
}

/// Agenda paging query
#[derive(Debug, Deserialize)]
pub struct AgendaQuery {
    pub offset: Option<u32>,
    pub count: Option<u32>,
}

/// Generic API error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn body<T>(payload: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    payload
        .map(|Json(value)| value)
        .map_err(|e| ApiError::InvalidRequest(e.body_text()))
}

// ============================================================================
// Handler functions
// ============================================================================

/// Health check endpoint
pub async fn health() -> &'static str {
    "OK"
}

/// Create an account and return it with a token
pub async fn register(
    State(state): State<AppState>,
    payload: std::result::Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Json<LoginGrant>> {
    let req = body(payload)?;
    let auth = state.auth.clone();

    // Password hashing is CPU bound
    let grant = tokio::task::spawn_blocking(move || {
        auth.register(
            req.login.as_deref().unwrap_or_default(),
            req.password.as_deref().unwrap_or_default(),
            req.name.as_deref(),
        )
    })
    .await??;

    Ok(Json(grant))
}

/// Check credentials and return a token
pub async fn login(
    State(state): State<AppState>,
    payload: std::result::Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginGrant>> {
    let req = body(payload)?;
    let auth = state.auth.clone();

    let grant = tokio::task::spawn_blocking(move || {
        auth.login(
            req.login.as_deref().unwrap_or_default(),
            req.password.as_deref().unwrap_or_default(),
        )
    })
    .await??;

    info!("User {} logged in", grant.user.login);
    Ok(Json(grant))
}

/// Profile of the token's owner
pub async fn me(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<MeResponse>> {
    let user = state.auth.profile(&identity)?;
    Ok(Json(MeResponse { user }))
}

/// All tasks of the caller, by date then start
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<Vec<TaskRecord>>> {
    let tasks = state.tasks.lock()?.list(&identity.user_id)?;
    Ok(Json(tasks))
}

pub async fn create_task(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    payload: std::result::Result<Json<TaskDraft>, JsonRejection>,
) -> Result<Json<TaskRecord>> {
    let task = body(payload)?
        .into_new_task()
        .map_err(dayline_core::Error::from)?;

    let record = state.tasks.lock()?.create(&identity.user_id, task)?;
    debug!("Task {} created by {}", record.id, identity.login);
    Ok(Json(record))
}

pub async fn update_task(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
    payload: std::result::Result<Json<PatchDraft>, JsonRejection>,
) -> Result<Json<TaskRecord>> {
    let patch = body(payload)?
        .into_patch()
        .map_err(dayline_core::Error::from)?;

    let record = state.tasks.lock()?.update(&identity.user_id, &id, &patch)?;
    Ok(Json(record))
}

pub async fn delete_task(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    state.tasks.lock()?.delete(&identity.user_id, &id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// A page of days from today with their timelines
pub async fn agenda(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Query(query): Query<AgendaQuery>,
) -> Result<Json<serde_json::Value>> {
    let records = state.tasks.lock()?.list(&identity.user_id)?;

    let page = agenda_page(
        &records,
        state.clock.as_ref(),
        &state.config.calendar,
        query.offset.unwrap_or(0),
        query.count.unwrap_or(0),
    );
    Ok(Json(serde_json::to_value(&page).map_err(dayline_core::Error::from)?))
}

/// One day's occurrences and timeline
pub async fn day(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(date): Path<String>,
) -> Result<Json<serde_json::Value>> {
    let date = parse_date(&date).map_err(dayline_core::Error::from)?;
    let records = state.tasks.lock()?.list(&identity.user_id)?;

    let day = day_view(&records, date, state.clock.as_ref(), &state.config.calendar);
    Ok(Json(serde_json::to_value(&day).map_err(dayline_core::Error::from)?))
}
