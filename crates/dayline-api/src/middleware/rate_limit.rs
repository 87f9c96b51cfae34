//! Login throttling
//!
//! Counts login attempts per client in a fixed window.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use tokio::sync::RwLock;
use tracing::warn;

use crate::error::ApiError;

/// Rate limiter configuration
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Maximum attempts per window
    pub max_requests: u32,
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 10,
            window: Duration::from_secs(60),
        }
    }
}

#[derive(Clone)]
struct ClientState {
    request_count: u32,
    window_start: Instant,
}

/// In-memory rate limiter
#[derive(Clone)]
pub struct RateLimiter {
    config: RateLimitConfig,
    clients: Arc<RwLock<HashMap<String, ClientState>>>,
}

impl RateLimiter {
    pub fn new(max_per_minute: u32) -> Self {
        Self::with_config(RateLimitConfig {
            max_requests: max_per_minute,
            ..RateLimitConfig::default()
        })
    }

    pub fn with_config(config: RateLimitConfig) -> Self {
        Self {
            config,
            clients: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn window(&self) -> Duration {
        self.config.window
    }

    /// Record an attempt and report whether it is allowed
    pub async fn check(&self, client_id: &str) -> bool {
        let mut clients = self.clients.write().await;
        let now = Instant::now();

        let state = clients.entry(client_id.to_string()).or_insert(ClientState {
            request_count: 0,
            window_start: now,
        });

        if now.duration_since(state.window_start) > self.config.window {
            state.request_count = 0;
            state.window_start = now;
        }

        if state.request_count >= self.config.max_requests {
            warn!("Login attempts throttled for client: {}", client_id);
            return false;
        }

        state.request_count += 1;
        true
    }

    /// Drop expired entries
    pub async fn cleanup(&self) {
        let mut clients = self.clients.write().await;
        let now = Instant::now();

        clients.retain(|_, state| now.duration_since(state.window_start) <= self.config.window);
    }

    #[cfg(test)]
    async fn tracked(&self) -> usize {
        self.clients.read().await.len()
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::with_config(RateLimitConfig::default())
    }
}

/// Identify the client by `x-forwarded-for`, else the peer address
fn client_id(request: &Request) -> String {
    request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .or_else(|| {
            request
                .extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string())
        })
        .unwrap_or_else(|| "unknown".to_string())
}

/// Throttle the routes it is layered on
pub async fn rate_limit_middleware(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if !limiter.check(&client_id(&request)).await {
        return Err(ApiError::TooManyRequests);
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rate_limiter_allows_within_limit() {
        let limiter = RateLimiter::new(3);

        assert!(limiter.check("client1").await);
        assert!(limiter.check("client1").await);
        assert!(limiter.check("client1").await);

        assert!(!limiter.check("client1").await);
    }

    #[tokio::test]
    async fn test_rate_limiter_different_clients() {
        let limiter = RateLimiter::new(2);

        assert!(limiter.check("client1").await);
        assert!(limiter.check("client1").await);
        assert!(!limiter.check("client1").await);

        assert!(limiter.check("client2").await);
        assert!(limiter.check("client2").await);
    }

    #[tokio::test]
    async fn test_window_expiry_resets_count() {
        let limiter = RateLimiter::with_config(RateLimitConfig {
            max_requests: 1,
            window: Duration::from_millis(20),
        });

        assert!(limiter.check("client1").await);
        assert!(!limiter.check("client1").await);

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert!(limiter.check("client1").await);
    }

    #[tokio::test]
    async fn test_cleanup_drops_expired() {
        let limiter = RateLimiter::with_config(RateLimitConfig {
            max_requests: 5,
            window: Duration::from_millis(10),
        });
        limiter.check("client1").await;
        assert_eq!(limiter.tracked().await, 1);

        tokio::time::sleep(Duration::from_millis(30)).await;
        limiter.cleanup().await;
        assert_eq!(limiter.tracked().await, 0);
    }
}
