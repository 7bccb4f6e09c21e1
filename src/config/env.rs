//! Environment variable handling and .env file management

use crate::error::{AppError, Result};
use std::path::Path;

/// Environment variable configuration manager
pub struct EnvManager;

impl EnvManager {
    /// Load .env from the working directory if it exists
    pub fn load_env_file(debug: bool) -> Result<()> {
        Self::load_env_from(Path::new(".env"), debug)
    }

    /// Load a specific env file; a missing file is not an error
    pub fn load_env_from(path: &Path, debug: bool) -> Result<()> {
        if path.exists() {
            dotenv::from_path(path)
                .map_err(|e| AppError::config(format!("Failed to load {}: {}", path.display(), e)))?;

            if debug {
                eprintln!("Loaded configuration from {}", path.display());
            }
        } else if debug {
            eprintln!("No {} file found, using defaults and CLI arguments", path.display());
        }

        Ok(())
    }

    /// Create example .env file content
    pub fn create_example_env_content() -> String {
        r#"# Network Tools Configuration
#
# Values here are used as defaults and can be overridden by
# command-line arguments.

# Splunk installation root; stash files go to $SPLUNK_HOME/var/spool/splunk
# SPLUNK_HOME=/opt/splunk

# Explicit spool directory (takes precedence over SPLUNK_HOME)
# NETTOOLS_SPOOL_DIR=/opt/splunk/var/spool/splunk

# KV store management endpoint
# KVSTORE_URL=https://127.0.0.1:8089

# Session key for KV store lookups
# SPLUNK_SESSION_KEY=

# Accept self-signed KV store certificates (true/false)
# KVSTORE_INSECURE=false

# HTTP request timeout in seconds (1-300)
# HTTP_TIMEOUT_SECONDS=30

# Enable colored output (true/false)
# ENABLE_COLOR=true
"#
        .to_string()
    }

    /// Validate environment variable format before parsing
    pub fn validate_env_var(key: &str, value: &str) -> Result<()> {
        match key {
            "KVSTORE_URL" => {
                let parsed = url::Url::parse(value.trim())
                    .map_err(|e| AppError::config(format!("Invalid KVSTORE_URL '{}': {}", value, e)))?;
                if parsed.scheme() != "http" && parsed.scheme() != "https" {
                    return Err(AppError::config(format!("KVSTORE_URL must use http or https: {}", value)));
                }
            }
            "SPLUNK_SESSION_KEY" => {
                if value.trim().is_empty() {
                    return Err(AppError::config("SPLUNK_SESSION_KEY is set but empty"));
                }
            }
            "HTTP_TIMEOUT_SECONDS" => {
                let timeout: u64 = value
                    .parse()
                    .map_err(|e| AppError::config(format!("Invalid HTTP_TIMEOUT_SECONDS value '{}': {}", value, e)))?;
                if timeout == 0 || timeout > 300 {
                    return Err(AppError::config(format!(
                        "HTTP_TIMEOUT_SECONDS must be between 1 and 300, got: {}",
                        timeout
                    )));
                }
            }
            "KVSTORE_INSECURE" | "ENABLE_COLOR" => {
                value
                    .parse::<bool>()
                    .map_err(|e| AppError::config(format!("Invalid {} value '{}': {}", key, value, e)))?;
            }
            "SPLUNK_HOME" | "NETTOOLS_SPOOL_DIR" => {
                if value.trim().is_empty() {
                    return Err(AppError::config(format!("{} is set but empty", key)));
                }
            }
            _ => {}
        }

        Ok(())
    }

    /// Supported variables with descriptions and examples
    pub fn get_supported_env_vars() -> Vec<(&'static str, &'static str, &'static str)> {
        vec![
            ("SPLUNK_HOME", "Splunk installation root", "/opt/splunk"),
            ("NETTOOLS_SPOOL_DIR", "Spool directory for stash files", "/opt/splunk/var/spool/splunk"),
            ("KVSTORE_URL", "KV store management endpoint", "https://127.0.0.1:8089"),
            ("SPLUNK_SESSION_KEY", "Session key for KV store lookups", "<session key>"),
            ("KVSTORE_INSECURE", "Accept self-signed KV store certificates", "false"),
            ("HTTP_TIMEOUT_SECONDS", "HTTP request timeout in seconds (1-300)", "30"),
            ("ENABLE_COLOR", "Enable colored output", "true"),
        ]
    }

    /// Display environment variable help
    pub fn display_env_help() -> String {
        let mut help = String::new();
        help.push_str("Supported Environment Variables:\n\n");

        for (var, description, example) in Self::get_supported_env_vars() {
            help.push_str(&format!("  {:<22} {}\n", var, description));
            help.push_str(&format!("  {:<22} Example: {}\n\n", "", example));
        }

        help.push_str("Configuration Priority (highest to lowest):\n");
        help.push_str("  1. Command-line arguments\n");
        help.push_str("  2. Environment variables\n");
        help.push_str("  3. .env file values\n");
        help.push_str("  4. Default values\n");

        help
    }

    /// Validate all currently set environment variables
    pub fn validate_current_env() -> Vec<String> {
        Self::get_supported_env_vars()
            .into_iter()
            .filter_map(|(var_name, _, _)| {
                let value = std::env::var(var_name).ok()?;
                Self::validate_env_var(var_name, &value).err().map(|e| format!("Warning: {}", e))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_example_content_lists_every_variable() {
        let content = EnvManager::create_example_env_content();
        for (name, _, _) in EnvManager::get_supported_env_vars() {
            assert!(content.contains(&format!("{}=", name)), "missing {}", name);
        }
    }

    #[test]
    fn test_validate_env_var() {
        assert!(EnvManager::validate_env_var("KVSTORE_URL", "https://127.0.0.1:8089").is_ok());
        assert!(EnvManager::validate_env_var("HTTP_TIMEOUT_SECONDS", "10").is_ok());
        assert!(EnvManager::validate_env_var("KVSTORE_INSECURE", "true").is_ok());
        assert!(EnvManager::validate_env_var("ENABLE_COLOR", "false").is_ok());
        assert!(EnvManager::validate_env_var("SOMETHING_ELSE", "whatever").is_ok());

        assert!(EnvManager::validate_env_var("KVSTORE_URL", "not-a-url").is_err());
        assert!(EnvManager::validate_env_var("KVSTORE_URL", "ftp://host").is_err());
        assert!(EnvManager::validate_env_var("SPLUNK_SESSION_KEY", "  ").is_err());
        assert!(EnvManager::validate_env_var("HTTP_TIMEOUT_SECONDS", "0").is_err());
        assert!(EnvManager::validate_env_var("HTTP_TIMEOUT_SECONDS", "301").is_err());
        assert!(EnvManager::validate_env_var("ENABLE_COLOR", "maybe").is_err());
        assert!(EnvManager::validate_env_var("SPLUNK_HOME", "").is_err());
    }

    #[test]
    fn test_display_env_help() {
        let help = EnvManager::display_env_help();
        assert!(help.contains("Supported Environment Variables:"));
        assert!(help.contains("SPLUNK_SESSION_KEY"));
        assert!(help.contains("Configuration Priority"));
    }

    #[test]
    fn test_load_env_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "NETTOOLS_ENV_LOADER_TEST=loaded").unwrap();

        EnvManager::load_env_from(file.path(), false).unwrap();
        assert_eq!(std::env::var("NETTOOLS_ENV_LOADER_TEST").unwrap(), "loaded");
    }

    #[test]
    fn test_missing_env_file_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(EnvManager::load_env_from(&dir.path().join(".env"), false).is_ok());
    }
}
