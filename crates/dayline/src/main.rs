//! dayline: personal day planner
//!
//! Usage:
//!   dayline                  - Start server mode (HTTP API)
//!   dayline --cli            - Start the interactive terminal planner
//!   dayline --config <path>  - Read settings from a TOML file
//!   dayline --help           - Show help

mod cli;
mod render;

use dayline_api::AppState;
use dayline_core::Config;
use tracing_subscriber::EnvFilter;

/// Run mode
#[derive(Debug, Clone, PartialEq, Eq)]
enum RunMode {
    /// Server mode (HTTP API)
    Server,
    /// Interactive terminal mode
    Cli,
    /// Show help
    Help,
    /// Show version
    Version,
}

/// Parsed command line
#[derive(Debug, Clone, PartialEq, Eq)]
struct Args {
    mode: RunMode,
    config_path: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = parse_args(std::env::args().skip(1));

    match args.mode {
        RunMode::Help => {
            print_help();
            return Ok(());
        }
        RunMode::Version => {
            println!("dayline {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        _ => {}
    }

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    // Load .env file
    dotenvy::dotenv().ok();

    let config = match &args.config_path {
        Some(path) => Config::from_toml_file(path),
        None => Config::load(),
    }
    .map_err(|e| anyhow::anyhow!("Config error: {}", e))?;

    match args.mode {
        RunMode::Cli => {
            tracing::info!("Running in CLI mode");
            cli::run_cli(config).await
        }
        RunMode::Server => run_server(config).await,
        _ => Ok(()),
    }
}

/// Parse command line arguments
fn parse_args<I>(args: I) -> Args
where
    I: IntoIterator<Item = String>,
{
    let mut mode = RunMode::Server;
    let mut config_path = None;
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--cli" | "-c" => mode = RunMode::Cli,
            "--help" | "-h" => {
                mode = RunMode::Help;
                break;
            }
            "--version" | "-v" => {
                mode = RunMode::Version;
                break;
            }
            "--config" => config_path = args.next(),
            _ => {}
        }
    }

    Args { mode, config_path }
}

/// Print help message
fn print_help() {
    println!("dayline - personal day planner");
    println!();
    println!("Usage:");
    println!("  dayline                  Start server mode (HTTP API)");
    println!("  dayline --cli            Start the interactive terminal planner");
    println!("  dayline --config <path>  Read settings from a TOML file");
    println!("  dayline --help           Show this help message");
    println!("  dayline --version        Show version");
    println!();
    println!("Without --config, ./dayline.toml is used when present.");
    println!();
    println!("Environment Variables:");
    println!("  DAYLINE_HOST             Bind address (default: 127.0.0.1)");
    println!("  DAYLINE_PORT             HTTP API port (default: 3000)");
    println!("  DAYLINE_ALLOWED_ORIGINS  Comma separated CORS origins (default: localhost)");
    println!("  DAYLINE_DB_PATH          SQLite database (default: data/dayline.db)");
    println!("  DAYLINE_TOKEN_SECRET     Token signing secret (recommended)");
    println!("  DAYLINE_TOKEN_TTL_HOURS  Token lifetime in hours (default: no expiry)");
    println!("  DAYLINE_HOUR_HEIGHT      Timeline pixels per hour (default: 60)");
    println!("  DAYLINE_WINDOW_DAYS      Weekly expansion window (default: 56)");
}

/// Run server mode
async fn run_server(config: Config) -> anyhow::Result<()> {
    tracing::info!("Starting dayline...");

    let state = AppState::open(config)
        .map_err(|e| anyhow::anyhow!("Failed to open database: {}", e))?;

    let handle = tokio::spawn(async move {
        if let Err(e) = dayline_api::start_server(state).await {
            tracing::error!("HTTP API error: {}", e);
        }
    });

    tracing::info!("dayline initialized successfully");
    tracing::info!("Press Ctrl+C to exit");

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down...");

    handle.abort();

    tracing::info!("Shutdown complete");
    Ok(())
}
