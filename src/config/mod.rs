//! Configuration module for the notes backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Default summarization endpoint.
pub const DEFAULT_SUMMARY_URL: &str = "https://api.edenai.run/v2/text/summarize";

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding one JSON file per storage slot
    pub data_dir: PathBuf,
    /// Keep notes in memory only; nothing is written to `data_dir`
    pub ephemeral: bool,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Bearer token for the summarization provider; summaries are disabled when unset
    pub summary_api_key: Option<String>,
    pub summary_url: String,
    /// Provider name sent in the request and looked up in the response
    pub summary_provider: String,
    pub summary_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let data_dir = env::var("NOTES_DATA_DIR")
            .unwrap_or_else(|_| "./data".to_string())
            .into();

        let ephemeral = env::var("NOTES_EPHEMERAL")
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let bind_addr = env::var("NOTES_BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
            .parse()
            .expect("Invalid NOTES_BIND_ADDR format");

        let log_level = env::var("NOTES_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let summary_api_key = env::var("NOTES_SUMMARY_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty());

        let summary_url =
            env::var("NOTES_SUMMARY_URL").unwrap_or_else(|_| DEFAULT_SUMMARY_URL.to_string());

        let summary_provider =
            env::var("NOTES_SUMMARY_PROVIDER").unwrap_or_else(|_| "openai".to_string());

        let summary_timeout = env::var("NOTES_SUMMARY_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .map(Duration::from_secs)
            .expect("Invalid NOTES_SUMMARY_TIMEOUT_SECS value");

        Self {
            data_dir,
            ephemeral,
            bind_addr,
            log_level,
            summary_api_key,
            summary_url,
            summary_provider,
            summary_timeout,
        }
    }
}
