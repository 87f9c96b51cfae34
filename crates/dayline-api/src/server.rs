//! HTTP API Server
//!
//! Starts and manages the axum-based HTTP server.

use axum::Router;
use axum::http::{HeaderValue, Method, request::Parts};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use dayline_core::{AuthService, Clock, Config, SystemClock, TaskStore};

use crate::middleware::rate_limit::RateLimiter;
use crate::routes::routes;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub auth: Arc<AuthService>,
    /// Task storage (wrapped in Mutex for thread safety)
    pub tasks: Arc<Mutex<TaskStore>>,
    pub clock: Arc<dyn Clock>,
    pub limiter: Arc<RateLimiter>,
}

impl AppState {
    pub fn new(config: Config, auth: AuthService, tasks: TaskStore, clock: Arc<dyn Clock>) -> Self {
        let limiter = RateLimiter::new(config.auth.login_attempts);
        Self {
            config: Arc::new(config),
            auth: Arc::new(auth),
            tasks: Arc::new(Mutex::new(tasks)),
            clock,
            limiter: Arc::new(limiter),
        }
    }

    /// Open the SQLite database named in the config, creating its directory
    pub fn open(config: Config) -> dayline_core::Result<Self> {
        let db_path = config.database.db_path.clone();
        if let Some(parent) = Path::new(&db_path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let auth = AuthService::open(&db_path, &config.auth)?;
        let tasks = TaskStore::new(&db_path)?;
        info!("Database opened at {}", db_path);

        Ok(Self::new(config, auth, tasks, Arc::new(SystemClock)))
    }
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origin = if allowed_origins.is_empty() {
        AllowOrigin::predicate(|origin: &HeaderValue, _: &Parts| {
            origin.to_str().is_ok_and(|o| {
                ["http://localhost", "http://127.0.0.1"]
                    .iter()
                    .any(|local| o == *local || o.starts_with(&format!("{local}:")))
            })
        })
    } else {
        let origins: Vec<HeaderValue> = allowed_origins
            .iter()
            .filter_map(|o| match HeaderValue::from_str(o) {
                Ok(v) => Some(v),
                Err(_) => {
                    warn!("Ignoring invalid CORS origin: {}", o);
                    None
                }
            })
            .collect();
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers(Any)
}

/// Build the full application router
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(routes(&state))
        .layer(cors_layer(&state.config.server.allowed_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP API server
pub async fn start_server(state: AppState) -> anyhow::Result<()> {
    let addr = state.config.server.bind_addr();

    // Forget throttling entries once their window has passed
    let limiter = state.limiter.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(limiter.window().max(Duration::from_secs(1)));
        loop {
            interval.tick().await;
            limiter.cleanup().await;
        }
    });

    let app = app(state);

    info!("HTTP API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;

    Ok(())
}
