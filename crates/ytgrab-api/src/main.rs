//! Axum API server binary.

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use ytgrab_api::{create_router, ApiConfig, AppState};
use ytgrab_media::{FileReaper, MediaBackend, YtDlpBackend};

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env()
        .add_directive("ytgrab=info".parse().unwrap());

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }

    info!("Starting ytgrab-api");

    // Load configuration
    let config = ApiConfig::from_env();
    info!("API config: host={}, port={}", config.host, config.port);

    // yt-dlp is required; refuse to start without it
    let backend = match YtDlpBackend::detect().await {
        Ok(b) => b,
        Err(e) => {
            error!("yt-dlp is not usable: {}", e);
            std::process::exit(1);
        }
    };
    info!("Found yt-dlp {}", backend.version());

    // Cookies are optional; downloads of age-gated videos fail without them
    let backend = match config.materialize_cookies() {
        Ok(true) => {
            info!(path = %config.cookies_file.display(), "Using cookies file");
            backend.with_cookies(config.cookies_file.clone())
        }
        Ok(false) => backend,
        Err(e) => {
            warn!("Could not write cookies file: {}", e);
            backend
        }
    };

    if let Err(e) = tokio::fs::create_dir_all(&config.temp_dir).await {
        error!(dir = %config.temp_dir.display(), "Failed to create temp dir: {}", e);
        std::process::exit(1);
    }

    let state = AppState::new(config.clone(), Arc::new(backend));

    // Reap leftovers from a previous run, then sweep periodically
    let reaper = FileReaper::new(config.temp_dir.clone(), config.max_file_age);
    reaper.sweep().await;
    let registry = Arc::clone(&state.registry);
    let max_file_age = config.max_file_age;
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(config.reap_interval);
        ticker.tick().await; // first tick fires immediately
        loop {
            ticker.tick().await;
            reaper.sweep().await;
            registry.prune_terminal(max_file_age);
        }
    });

    // Create router
    let app = create_router(state.clone());

    // Bind and serve
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .expect("Invalid bind address");

    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap();

    // Let in-flight downloads finish before exiting
    state.tasks.close();
    state.tasks.wait().await;

    info!("Server shutdown complete");
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install CTRL+C handler");
    info!("Received shutdown signal");
}
