//! dayline-api: HTTP API for Dayline
//!
//! JSON endpoints for accounts, tasks and the planned day timelines.
//! Built with axum.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod server;

pub use error::{ApiError, Result};
pub use server::{AppState, app, start_server};
