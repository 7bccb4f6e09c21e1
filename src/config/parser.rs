//! Configuration parsing from CLI arguments and environment variables

use crate::{cli::Cli, config::env::EnvManager, error::Result, models::Config};

/// Configuration parser that combines CLI arguments with environment variables
pub struct ConfigParser {
    cli: Cli,
}

impl ConfigParser {
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Defaults, then `.env`, then the environment, then the command line
    pub fn parse(&self) -> Result<Config> {
        let mut config = Config::default();

        EnvManager::load_env_file(self.cli.debug)?;

        if self.cli.debug {
            for warning in EnvManager::validate_current_env() {
                eprintln!("{}", warning);
            }
        }

        config.merge_from_env()?;
        self.apply_cli_overrides(&mut config);
        config.validate()?;

        Ok(config)
    }

    /// Apply CLI argument overrides to configuration
    pub fn apply_cli_overrides(&self, config: &mut Config) {
        if let Some(spool_dir) = &self.cli.spool_dir {
            config.spool_dir = spool_dir.clone();
        }

        if let Some(kvstore_url) = &self.cli.kvstore_url {
            config.kvstore_url = kvstore_url.trim().trim_end_matches('/').to_string();
        }

        if let Some(session_key) = &self.cli.session_key {
            config.session_key = crate::models::config::non_blank(session_key);
        }

        if self.cli.insecure {
            config.kvstore_insecure = true;
        }

        if let Some(timeout) = self.cli.timeout {
            config.http_timeout_seconds = timeout;
        }

        if self.cli.color {
            config.enable_color = true;
        } else if self.cli.no_color {
            config.enable_color = false;
        }

        config.output_format = self.cli.format;

        // CLI-only flags
        config.verbose = self.cli.verbose;
        config.debug = self.cli.debug;
    }
}

/// Load the complete configuration for a parsed command line
pub fn load_config(cli: &Cli) -> Result<Config> {
    ConfigParser::new(cli.clone()).parse()
}

/// Display configuration summary for debug purposes
pub fn display_config_summary(config: &Config) -> String {
    let summary = [
        format!("Spool Directory: {}", config.spool_dir.display()),
        format!("KV Store URL: {}", config.kvstore_url),
        format!("KV Store Collection: {}/{}", config.kvstore_app, config.kvstore_collection),
        format!("Session Key: {}", if config.session_key.is_some() { "set" } else { "not set" }),
        format!("Accept Invalid Certificates: {}", config.kvstore_insecure),
        format!("HTTP Timeout: {}s", config.http_timeout_seconds),
        format!("Color Output: {}", config.enable_color),
        format!("Verbose: {}", config.verbose),
        format!("Debug: {}", config.debug),
    ];

    summary.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::OutputFormat;
    use clap::Parser;
    use std::path::PathBuf;

    fn overridden(args: &[&str]) -> Config {
        let mut config = Config::default();
        ConfigParser::new(Cli::parse_from(args)).apply_cli_overrides(&mut config);
        config
    }

    #[test]
    fn test_cli_overrides() {
        let config = overridden(&[
            "nettools", "--spool-dir", "/tmp/spool", "--kvstore-url", "https://splunk:8089/", "--session-key",
            " abc ", "--insecure", "--timeout", "5", "--no-color", "--verbose", "--format", "json", "speedtest",
        ]);

        assert_eq!(config.spool_dir, PathBuf::from("/tmp/spool"));
        assert_eq!(config.kvstore_url, "https://splunk:8089");
        assert_eq!(config.session_key.as_deref(), Some("abc"));
        assert!(config.kvstore_insecure);
        assert_eq!(config.http_timeout_seconds, 5);
        assert!(!config.enable_color);
        assert!(config.verbose);
        assert!(!config.debug);
        assert_eq!(config.output_format, OutputFormat::Json);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_no_flags_keep_existing_values() {
        let mut config = Config::default();
        config.session_key = Some("from-env".to_string());
        config.http_timeout_seconds = 12;

        ConfigParser::new(Cli::parse_from(["nettools", "speedtest"])).apply_cli_overrides(&mut config);

        assert_eq!(config.session_key.as_deref(), Some("from-env"));
        assert_eq!(config.http_timeout_seconds, 12);
        assert_eq!(config.output_format, OutputFormat::Text);
    }

    #[test]
    fn test_blank_session_key_counts_as_unset() {
        let config = overridden(&["nettools", "--session-key", "  ", "ping", "example.com"]);
        assert!(config.session_key.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_color_flag_forces_color() {
        let mut config = Config::default();
        config.enable_color = false;
        ConfigParser::new(Cli::parse_from(["nettools", "--color", "speedtest"])).apply_cli_overrides(&mut config);
        assert!(config.enable_color);
    }

    #[test]
    fn test_config_summary_hides_session_key() {
        let mut config = Config::default();
        config.session_key = Some("secret".to_string());
        let summary = display_config_summary(&config);

        assert!(summary.contains("Spool Directory:"));
        assert!(summary.contains("Session Key: set"));
        assert!(!summary.contains("secret"));
    }
}
