//! Axum HTTP API for the ytgrab download service.
//!
//! This crate provides:
//! - The in-memory job registry and background download workers
//! - REST endpoints for metadata, downloads, progress and file retrieval
//! - Startup wiring for the yt-dlp backend and the file reaper

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod registry;
pub mod routes;
pub mod state;
pub mod worker;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use registry::JobRegistry;
pub use routes::create_router;
pub use state::AppState;
