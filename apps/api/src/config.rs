use anyhow::{Context, Result};
use tracing::warn;

const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";
const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_YOUTUBE_BASE_URL: &str = "https://www.googleapis.com";

/// Application configuration loaded from environment variables.
///
/// The two API keys are read but not validated: a missing key surfaces later
/// as an authentication failure from the client that uses it.
#[derive(Debug, Clone)]
pub struct Config {
    pub google_api_key: String,
    pub youtube_api_key: String,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub youtube_base_url: String,
    pub max_video_results: u32,
    pub max_upload_bytes: usize,
    /// Directory holding the pdfium shared library. Falls back to the system library when unset.
    pub pdfium_library_path: Option<String>,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            google_api_key: secret_env("GOOGLE_API_KEY"),
            youtube_api_key: secret_env("YOUTUBE_API_KEY"),
            gemini_model: env_or("GEMINI_MODEL", DEFAULT_GEMINI_MODEL),
            gemini_base_url: env_or("GEMINI_BASE_URL", DEFAULT_GEMINI_BASE_URL),
            youtube_base_url: env_or("YOUTUBE_BASE_URL", DEFAULT_YOUTUBE_BASE_URL),
            max_video_results: env_or("MAX_VIDEO_RESULTS", "3")
                .parse::<u32>()
                .context("MAX_VIDEO_RESULTS must be a non-negative integer")?,
            max_upload_bytes: env_or("MAX_UPLOAD_BYTES", "10485760")
                .parse::<usize>()
                .context("MAX_UPLOAD_BYTES must be a byte count")?,
            pdfium_library_path: std::env::var("PDFIUM_LIBRARY_PATH").ok(),
            port: env_or("PORT", "8080")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: env_or("RUST_LOG", "info"),
        })
    }

    /// Logs a warning for every credential that is empty. Call after logging is initialized.
    pub fn warn_missing_secrets(&self) {
        for (key, value) in [
            ("GOOGLE_API_KEY", &self.google_api_key),
            ("YOUTUBE_API_KEY", &self.youtube_api_key),
        ] {
            if value.is_empty() {
                warn!("Environment variable '{key}' is not set; calls using it will fail to authenticate");
            }
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn secret_env(key: &str) -> String {
    std::env::var(key).unwrap_or_default()
}

#[cfg(test)]
impl Config {
    /// Configuration pointing nowhere, for handler tests that use fake clients.
    pub fn for_tests() -> Self {
        Config {
            google_api_key: "test-google-key".to_string(),
            youtube_api_key: "test-youtube-key".to_string(),
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            gemini_base_url: "http://127.0.0.1:9".to_string(),
            youtube_base_url: "http://127.0.0.1:9".to_string(),
            max_video_results: 3,
            max_upload_bytes: 1024 * 1024,
            pdfium_library_path: None,
            port: 0,
            rust_log: "debug".to_string(),
        }
    }
}
