//! API configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Server configuration, sourced from environment variables.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Debug flag, surfaced via /api/system-info
    pub debug: bool,
    /// Directory job output files are written to
    pub temp_dir: PathBuf,
    /// Age at which job output files become eligible for reaping
    pub max_file_age: Duration,
    /// Interval between reaper sweeps
    pub reap_interval: Duration,
    /// Netscape cookies file handed to yt-dlp when present
    pub cookies_file: PathBuf,
    /// Max request body size
    pub max_body_size: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            debug: false,
            temp_dir: std::env::temp_dir(),
            max_file_age: Duration::from_secs(3600),
            reap_interval: Duration::from_secs(300),
            cookies_file: PathBuf::from("cookies.txt"),
            max_body_size: 16 * 1024 * 1024, // 16MB
        }
    }
}

impl ApiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("HOST").unwrap_or(defaults.host),
            port: std::env::var("PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.port),
            debug: std::env::var("DEBUG")
                .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
                .unwrap_or(defaults.debug),
            temp_dir: std::env::var("TEMP_FOLDER")
                .map(PathBuf::from)
                .unwrap_or(defaults.temp_dir),
            max_file_age: std::env::var("MAX_FILE_AGE")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.max_file_age),
            reap_interval: std::env::var("REAP_INTERVAL")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.reap_interval),
            cookies_file: defaults.cookies_file,
            max_body_size: defaults.max_body_size,
        }
    }

    /// Write `COOKIES_DATA` to the cookies file when the file is absent.
    ///
    /// Returns whether a usable cookies file exists afterwards.
    pub fn materialize_cookies(&self) -> std::io::Result<bool> {
        if self.cookies_file.exists() {
            return Ok(true);
        }
        match std::env::var("COOKIES_DATA") {
            Ok(data) if !data.trim().is_empty() => {
                std::fs::write(&self.cookies_file, data)?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ApiConfig::default();
        assert_eq!(config.port, 5000);
        assert_eq!(config.max_file_age, Duration::from_secs(3600));
        assert!(!config.debug);
        assert_eq!(config.cookies_file, PathBuf::from("cookies.txt"));
    }

    #[test]
    fn test_materialize_cookies_with_existing_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("cookies.txt");
        std::fs::write(&path, "# Netscape HTTP Cookie File\n").unwrap();

        let config = ApiConfig {
            cookies_file: path,
            ..ApiConfig::default()
        };
        assert!(config.materialize_cookies().unwrap());
    }

    #[test]
    fn test_materialize_cookies_without_file_or_env() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = ApiConfig {
            cookies_file: dir.path().join("missing-cookies.txt"),
            ..ApiConfig::default()
        };
        // COOKIES_DATA is not set in the test environment.
        assert!(!config.materialize_cookies().unwrap());
        assert!(!config.cookies_file.exists());
    }
}
