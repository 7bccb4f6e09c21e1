//! Command-line interface: global options and one subcommand per tool

pub mod help;

pub use help::HelpSystem;

use crate::{
    defaults::{DEFAULT_PING_COUNT, DEFAULT_SPEEDTEST_RUNS},
    tools::{EmitOptions, PingRequest, SpeedtestRequest, TracerouteRequest, WakeOnLanRequest},
    types::OutputFormat,
};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Network Tools - ping, traceroute, speedtest and wake-on-LAN with event output
#[derive(Parser, Debug, Clone)]
#[command(name = "nettools")]
#[command(about, long_about = None)]
#[command(disable_version_flag = true)]
pub struct Cli {
    /// Directory stash files are written to (default: $SPLUNK_HOME/var/spool/splunk)
    #[arg(long, global = true, value_name = "DIR")]
    pub spool_dir: Option<PathBuf>,

    /// Base URL of the KV store REST API
    #[arg(long, global = true, value_name = "URL")]
    pub kvstore_url: Option<String>,

    /// Session key used to authenticate against the KV store
    #[arg(long, global = true, value_name = "KEY")]
    pub session_key: Option<String>,

    /// Accept invalid TLS certificates from the KV store
    #[arg(long, global = true)]
    pub insecure: bool,

    /// HTTP request timeout in seconds
    #[arg(long, global = true, value_parser = parse_timeout, value_name = "SECONDS")]
    pub timeout: Option<u64>,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Force colored output
    #[arg(long, global = true)]
    pub color: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Enable verbose output
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Enable debug output
    #[arg(long, global = true)]
    pub debug: bool,

    /// Print version and build information
    #[arg(short = 'V', long)]
    pub version: bool,

    /// Show help for a specific topic (config, stash, examples)
    #[arg(long, value_name = "TOPIC")]
    pub help_topic: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Indexing options shared by every subcommand
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexArgs {
    /// Write the result as a stash event into this index
    #[arg(long)]
    pub index: Option<String>,

    /// Override the event sourcetype
    #[arg(long)]
    pub sourcetype: Option<String>,

    /// Override the event source
    #[arg(long)]
    pub source: Option<String>,
}

impl IndexArgs {
    pub fn to_emit_options(&self) -> EmitOptions {
        EmitOptions {
            index: self.index.clone(),
            sourcetype: self.sourcetype.clone(),
            source: self.source.clone(),
        }
    }
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Ping a host with the system ping binary
    Ping {
        host: String,

        /// Number of echo requests (1-100)
        #[arg(short = 'c', long, default_value_t = DEFAULT_PING_COUNT)]
        count: u32,

        #[command(flatten)]
        index: IndexArgs,
    },

    /// Trace the route to a host with the system traceroute binary
    Traceroute {
        host: String,

        /// Correlation id stamped on every emitted hop
        #[arg(long)]
        unique_id: Option<String>,

        /// Keep destination ip/host off the returned hops
        #[arg(long)]
        no_dest_info: bool,

        #[command(flatten)]
        index: IndexArgs,
    },

    /// Measure latency and bandwidth against a speedtest server
    Speedtest {
        /// Server as host[:port]; the closest one is chosen when omitted
        #[arg(long)]
        server: Option<String>,

        /// Transfers per test file
        #[arg(long, default_value_t = DEFAULT_SPEEDTEST_RUNS)]
        runs: u32,

        #[command(flatten)]
        index: IndexArgs,
    },

    /// Send a wake-on-LAN magic packet
    #[command(name = "wakeonlan", alias = "wol")]
    WakeOnLan {
        /// Host name to look up in the KV store
        host: Option<String>,

        /// MAC address of the device
        #[arg(long)]
        mac: Option<String>,

        /// Destination address (default: 255.255.255.255)
        #[arg(long)]
        ip: Option<String>,

        /// Destination port (default: 9)
        #[arg(long)]
        port: Option<u16>,

        #[command(flatten)]
        index: IndexArgs,
    },
}

impl Commands {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Ping { .. } => "ping",
            Self::Traceroute { .. } => "traceroute",
            Self::Speedtest { .. } => "speedtest",
            Self::WakeOnLan { .. } => "wakeonlan",
        }
    }

    pub fn ping_request(&self) -> Option<PingRequest> {
        match self {
            Self::Ping { host, count, index } => Some(PingRequest {
                host: host.clone(),
                count: *count,
                emit: index.to_emit_options(),
            }),
            _ => None,
        }
    }

    pub fn traceroute_request(&self) -> Option<TracerouteRequest> {
        match self {
            Self::Traceroute { host, unique_id, no_dest_info, index } => Some(TracerouteRequest {
                host: host.clone(),
                unique_id: unique_id.clone(),
                include_dest_info: !no_dest_info,
                emit: index.to_emit_options(),
            }),
            _ => None,
        }
    }

    pub fn speedtest_request(&self) -> Option<SpeedtestRequest> {
        match self {
            Self::Speedtest { server, runs, index } => Some(SpeedtestRequest {
                server: server.clone(),
                runs: *runs,
                emit: index.to_emit_options(),
            }),
            _ => None,
        }
    }

    pub fn wakeonlan_request(&self) -> Option<WakeOnLanRequest> {
        match self {
            Self::WakeOnLan { host, mac, ip, port, index } => Some(WakeOnLanRequest {
                host: host.clone(),
                mac_address: mac.clone(),
                ip_address: ip.clone(),
                port: *port,
                emit: index.to_emit_options(),
            }),
            _ => None,
        }
    }

    /// Whether this command needs the KV store
    pub fn needs_host_directory(&self) -> bool {
        matches!(self, Self::WakeOnLan { host: Some(h), .. } if !h.trim().is_empty())
    }
}

impl Cli {
    /// Validate CLI arguments for conflicts and requirements
    pub fn validate(&self) -> Result<(), String> {
        if self.color && self.no_color {
            return Err("Cannot specify both --color and --no-color".to_string());
        }

        if self.command.is_none() && self.help_topic.is_none() && !self.version {
            return Err("A subcommand is required (ping, traceroute, speedtest, wakeonlan)".to_string());
        }

        Ok(())
    }

    /// Check if colors should be enabled
    pub fn use_colors(&self) -> bool {
        if self.color {
            true
        } else if self.no_color {
            false
        } else {
            supports_color()
        }
    }

    /// Display help for the requested topic, falling back to the overview
    pub fn display_help(&self) -> String {
        let help_system = HelpSystem::new();
        let use_colors = self.use_colors();

        match &self.help_topic {
            Some(topic) => help_system.display_topic_help(topic, use_colors).unwrap_or_else(|| {
                format!(
                    "Unknown help topic: '{}'\n\nAvailable topics: config, stash, examples\n\n{}",
                    topic,
                    help_system.display_main_help(use_colors)
                )
            }),
            None => help_system.display_main_help(use_colors),
        }
    }
}

/// Parse a timeout in seconds (1-300)
fn parse_timeout(s: &str) -> Result<u64, String> {
    if s.starts_with('+') || s.starts_with("0x") || s.starts_with("0X") {
        return Err(format!("Invalid timeout: {}", s));
    }

    s.parse::<u64>()
        .map_err(|_| format!("Invalid timeout: {}", s))
        .and_then(|secs| {
            if secs == 0 {
                Err("Timeout must be greater than 0".to_string())
            } else if secs > 300 {
                Err("Timeout cannot exceed 300 seconds".to_string())
            } else {
                Ok(secs)
            }
        })
}

/// Check if the terminal supports color output
fn supports_color() -> bool {
    if let Ok(term) = std::env::var("TERM") {
        if term == "dumb" {
            return false;
        }
    }

    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }

    if std::env::var("FORCE_COLOR").is_ok() {
        return true;
    }

    #[cfg(target_os = "windows")]
    {
        if std::env::var("ANSICON").is_ok() || std::env::var("ConEmuANSI").is_ok() {
            return true;
        }
    }

    #[cfg(unix)]
    {
        true
    }
    #[cfg(not(unix))]
    {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ping_subcommand() {
        let cli = Cli::parse_from(["nettools", "ping", "example.com", "-c", "3", "--index", "main"]);
        let request = cli.command.as_ref().unwrap().ping_request().unwrap();

        assert_eq!(request.host, "example.com");
        assert_eq!(request.count, 3);
        assert_eq!(request.emit.index.as_deref(), Some("main"));
        assert_eq!(request.emit.sourcetype, None);
    }

    #[test]
    fn test_ping_defaults() {
        let cli = Cli::parse_from(["nettools", "ping", "example.com"]);
        let request = cli.command.unwrap().ping_request().unwrap();
        assert_eq!(request.count, DEFAULT_PING_COUNT);
        assert_eq!(request.emit, EmitOptions::default());
    }

    #[test]
    fn test_traceroute_subcommand() {
        let cli = Cli::parse_from([
            "nettools", "traceroute", "example.com", "--unique-id", "abcd1234", "--no-dest-info",
            "--sourcetype", "tr", "--source", "cli",
        ]);
        let request = cli.command.unwrap().traceroute_request().unwrap();

        assert_eq!(request.unique_id.as_deref(), Some("abcd1234"));
        assert!(!request.include_dest_info);
        assert_eq!(request.emit.sourcetype.as_deref(), Some("tr"));
        assert_eq!(request.emit.source.as_deref(), Some("cli"));
    }

    #[test]
    fn test_speedtest_subcommand() {
        let cli = Cli::parse_from(["nettools", "speedtest", "--server", "speed.example.net:8080", "--runs", "3"]);
        let request = cli.command.unwrap().speedtest_request().unwrap();
        assert_eq!(request.server.as_deref(), Some("speed.example.net:8080"));
        assert_eq!(request.runs, 3);

        let cli = Cli::parse_from(["nettools", "speedtest"]);
        assert_eq!(cli.command.unwrap().speedtest_request().unwrap().runs, DEFAULT_SPEEDTEST_RUNS);
    }

    #[test]
    fn test_wakeonlan_subcommand() {
        let cli = Cli::parse_from(["nettools", "wakeonlan", "nas", "--port", "7"]);
        let command = cli.command.unwrap();
        assert!(command.needs_host_directory());

        let request = command.wakeonlan_request().unwrap();
        assert_eq!(request.host.as_deref(), Some("nas"));
        assert_eq!(request.port, Some(7));
        assert_eq!(request.mac_address, None);

        let cli = Cli::parse_from(["nettools", "wol", "--mac", "00:11:22:33:44:55"]);
        let command = cli.command.unwrap();
        assert_eq!(command.name(), "wakeonlan");
        assert!(!command.needs_host_directory());
    }

    #[test]
    fn test_global_options_after_subcommand() {
        let cli = Cli::parse_from([
            "nettools", "ping", "example.com", "--format", "json", "--no-color", "--spool-dir", "/tmp/spool",
            "--timeout", "10",
        ]);
        assert_eq!(cli.format, OutputFormat::Json);
        assert!(cli.no_color);
        assert_eq!(cli.spool_dir, Some(PathBuf::from("/tmp/spool")));
        assert_eq!(cli.timeout, Some(10));
    }

    #[test]
    fn test_validate() {
        let cli = Cli::parse_from(["nettools", "--color", "--no-color", "speedtest"]);
        assert!(cli.validate().is_err());

        let cli = Cli::parse_from(["nettools"]);
        assert!(cli.validate().is_err());

        let cli = Cli::parse_from(["nettools", "--help-topic", "stash"]);
        assert!(cli.validate().is_ok());
    }

    #[test]
    fn test_use_colors_flags() {
        assert!(!Cli::parse_from(["nettools", "--no-color", "speedtest"]).use_colors());
        assert!(Cli::parse_from(["nettools", "--color", "speedtest"]).use_colors());
    }

    #[test]
    fn test_timeout_parsing() {
        assert_eq!(parse_timeout("1").unwrap(), 1);
        assert_eq!(parse_timeout("300").unwrap(), 300);
        assert!(parse_timeout("0").is_err());
        assert!(parse_timeout("301").is_err());
        assert!(parse_timeout("+5").is_err());
        assert!(parse_timeout("abc").is_err());
    }

    #[test]
    fn test_unknown_help_topic_falls_back() {
        let cli = Cli::parse_from(["nettools", "--no-color", "--help-topic", "nope"]);
        assert!(cli.display_help().contains("Unknown help topic: 'nope'"));
    }
}
