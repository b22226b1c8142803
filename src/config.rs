use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {name}: {message}")]
    InvalidValue { name: String, message: String },
    #[error("failed to parse {name} as integer: {source}")]
    ParseInt {
        name: String,
        #[source]
        source: std::num::ParseIntError,
    },
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Timeline page
    pub timeline_url: String,
    pub page_timeout: Duration,

    // Scrape loop
    pub scroll_delay: Duration,
    pub expand_settle_delay: Duration,
    pub max_stalled_cycles: u32,

    // Export
    pub output_dir: PathBuf,

    // Browser
    pub chrome_path: Option<String>,
    pub user_data_dir: Option<PathBuf>,
    pub viewport_width: u32,
    pub viewport_height: u32,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required environment variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            timeline_url: required_env("TIMELINE_URL")?,
            page_timeout: Duration::from_secs(parse_env_u64("PAGE_TIMEOUT_SECS", 30)?),

            scroll_delay: Duration::from_millis(parse_env_u64("SCROLL_DELAY_MS", 2000)?),
            expand_settle_delay: Duration::from_millis(parse_env_u64("EXPAND_SETTLE_MS", 500)?),
            max_stalled_cycles: parse_env_u32("MAX_STALLED_CYCLES", 3)?,

            output_dir: PathBuf::from(env_or_default("OUTPUT_DIR", "./exports")),

            chrome_path: optional_env("CHROME_PATH"),
            user_data_dir: optional_env("BROWSER_USER_DATA_DIR").map(PathBuf::from),
            viewport_width: parse_env_u32("VIEWPORT_WIDTH", 1280)?,
            viewport_height: parse_env_u32("VIEWPORT_HEIGHT", 1600)?,
        })
    }

    /// Validate that the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeline_url.is_empty() {
            return Err(ConfigError::InvalidValue {
                name: "TIMELINE_URL".to_string(),
                message: "cannot be empty".to_string(),
            });
        }
        if !self.timeline_url.starts_with("http") {
            return Err(ConfigError::InvalidValue {
                name: "TIMELINE_URL".to_string(),
                message: "must be an http(s) URL".to_string(),
            });
        }
        if self.max_stalled_cycles == 0 {
            return Err(ConfigError::InvalidValue {
                name: "MAX_STALLED_CYCLES".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Configuration for tests: short delays, no required environment.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            timeline_url: "https://example.com/timeline".to_string(),
            page_timeout: Duration::from_secs(5),
            scroll_delay: Duration::from_millis(5),
            expand_settle_delay: Duration::from_millis(1),
            max_stalled_cycles: 3,
            output_dir: PathBuf::from("./exports"),
            chrome_path: None,
            user_data_dir: None,
            viewport_width: 1280,
            viewport_height: 1600,
        }
    }
}

fn required_env(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_string()))
}

fn optional_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn env_or_default(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parse_env_u64(name: &str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => val.parse().map_err(|e| ConfigError::ParseInt {
            name: name.to_string(),
            source: e,
        }),
        _ => Ok(default),
    }
}

fn parse_env_u32(name: &str, default: u32) -> Result<u32, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => val.parse().map_err(|e| ConfigError::ParseInt {
            name: name.to_string(),
            source: e,
        }),
        _ => Ok(default),
    }
}
