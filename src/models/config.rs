//! Configuration data model and validation

use crate::types::{AppError, OutputFormat, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory the indexer watches for stash files
    #[serde(default = "default_spool_dir")]
    pub spool_dir: PathBuf,

    /// Base URL of the management endpoint hosting the KV store
    #[serde(default = "default_kvstore_url")]
    pub kvstore_url: String,

    /// App namespace owning the hosts collection
    #[serde(default = "default_kvstore_app")]
    pub kvstore_app: String,

    /// Collection holding host records
    #[serde(default = "default_kvstore_collection")]
    pub kvstore_collection: String,

    /// Session key used to authenticate KV store requests
    #[serde(default, skip_serializing)]
    pub session_key: Option<String>,

    /// Accept self-signed certificates from the KV store
    #[serde(default)]
    pub kvstore_insecure: bool,

    /// Per-request HTTP timeout
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_seconds: u64,

    /// Where speedtest server discovery starts
    #[serde(default = "default_speedtest_directory_url")]
    pub speedtest_directory_url: String,

    /// Enable colored terminal output
    #[serde(default = "default_enable_color")]
    pub enable_color: bool,

    /// Result rendering
    #[serde(default)]
    pub output_format: OutputFormat,

    /// Enable verbose output
    #[serde(default)]
    pub verbose: bool,

    /// Enable debug output
    #[serde(default)]
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            spool_dir: default_spool_dir(),
            kvstore_url: default_kvstore_url(),
            kvstore_app: default_kvstore_app(),
            kvstore_collection: default_kvstore_collection(),
            session_key: None,
            kvstore_insecure: false,
            http_timeout_seconds: default_http_timeout_secs(),
            speedtest_directory_url: default_speedtest_directory_url(),
            enable_color: default_enable_color(),
            output_format: OutputFormat::default(),
            verbose: false,
            debug: false,
        }
    }
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Get HTTP timeout as Duration
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_seconds)
    }

    /// Spool directory below a Splunk installation root
    pub fn spool_dir_for_splunk_home(splunk_home: &Path) -> PathBuf {
        splunk_home.join(crate::defaults::SPOOL_SUBDIR)
    }

    /// Validate the configuration and return any errors
    pub fn validate(&self) -> Result<()> {
        if self.spool_dir.as_os_str().is_empty() {
            return Err(AppError::config("Spool directory cannot be empty"));
        }

        for (name, value) in [("KV store URL", &self.kvstore_url), ("Speedtest directory URL", &self.speedtest_directory_url)] {
            match url::Url::parse(value) {
                Ok(parsed) => {
                    if parsed.scheme() != "http" && parsed.scheme() != "https" {
                        return Err(AppError::config(format!("{} must use http or https: {}", name, value)));
                    }
                }
                Err(e) => {
                    return Err(AppError::config(format!("Invalid {} '{}': {}", name, value, e)));
                }
            }
        }

        if self.kvstore_app.trim().is_empty() || self.kvstore_collection.trim().is_empty() {
            return Err(AppError::config("KV store app and collection names cannot be empty"));
        }

        if let Some(key) = &self.session_key {
            if key.trim().is_empty() {
                return Err(AppError::config("Session key cannot be blank"));
            }
        }

        if self.http_timeout_seconds == 0 {
            return Err(AppError::config("HTTP timeout must be greater than 0"));
        }

        if self.http_timeout_seconds > 300 {
            return Err(AppError::config("HTTP timeout cannot exceed 300 seconds"));
        }

        Ok(())
    }

    /// Merge environment variables into this configuration
    pub fn merge_from_env(&mut self) -> Result<()> {
        if let Ok(spool_dir) = std::env::var("NETTOOLS_SPOOL_DIR") {
            self.spool_dir = PathBuf::from(spool_dir);
        } else if let Ok(splunk_home) = std::env::var("SPLUNK_HOME") {
            self.spool_dir = Self::spool_dir_for_splunk_home(Path::new(&splunk_home));
        }

        if let Ok(kvstore_url) = std::env::var("KVSTORE_URL") {
            self.kvstore_url = kvstore_url.trim().trim_end_matches('/').to_string();
        }

        // A blank key means "no key"; only host lookups need one
        if let Ok(session_key) = std::env::var("SPLUNK_SESSION_KEY") {
            self.session_key = non_blank(&session_key);
        }

        if let Ok(insecure) = std::env::var("KVSTORE_INSECURE") {
            self.kvstore_insecure = insecure.parse()
                .map_err(|e| AppError::config(format!("Invalid KVSTORE_INSECURE value '{}': {}", insecure, e)))?;
        }

        if let Ok(timeout) = std::env::var("HTTP_TIMEOUT_SECONDS") {
            self.http_timeout_seconds = timeout.parse()
                .map_err(|e| AppError::config(format!("Invalid HTTP_TIMEOUT_SECONDS value '{}': {}", timeout, e)))?;
        }

        if let Ok(enable_color) = std::env::var("ENABLE_COLOR") {
            self.enable_color = enable_color.parse()
                .map_err(|e| AppError::config(format!("Invalid ENABLE_COLOR value '{}': {}", enable_color, e)))?;
        }

        Ok(())
    }
}

// Default value functions for serde
/// Trimmed value, or `None` when nothing is left
pub(crate) fn non_blank(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn default_spool_dir() -> PathBuf {
    PathBuf::from(crate::defaults::FALLBACK_SPOOL_DIR)
}

fn default_kvstore_url() -> String {
    crate::defaults::DEFAULT_KVSTORE_URL.to_string()
}

fn default_kvstore_app() -> String {
    crate::defaults::DEFAULT_KVSTORE_APP.to_string()
}

fn default_kvstore_collection() -> String {
    crate::defaults::DEFAULT_KVSTORE_COLLECTION.to_string()
}

fn default_http_timeout_secs() -> u64 {
    crate::defaults::DEFAULT_HTTP_TIMEOUT.as_secs()
}

fn default_speedtest_directory_url() -> String {
    crate::defaults::SPEEDTEST_DIRECTORY_URL.to_string()
}

fn default_enable_color() -> bool {
    crate::defaults::DEFAULT_ENABLE_COLOR
}
