//! Middleware modules
//!
//! Bearer authentication and login throttling.

pub mod auth;
pub mod rate_limit;
