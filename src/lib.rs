//! Network Tools
//!
//! Wrappers around the system `ping` and `traceroute` binaries, an HTTP
//! bandwidth test and a wake-on-LAN sender. Results are reformatted into
//! structured records and optionally written as stash events for a
//! log-indexing pipeline.

pub mod app;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod executor;
pub mod logging;
pub mod models;
pub mod output;
pub mod parsers;
pub mod sink;
pub mod speedtest;
pub mod tools;
pub mod types;
pub mod wol;

// Re-export commonly used types
pub use error::{AppError, Result};
pub use models::{Config, HostRecord, PingResult, PingStats, SpeedtestResult, TracerouteHop, TracerouteResult, WakeOnLanResult};
pub use tools::ToolContext;

/// Application version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
pub const BUILD_TIME: &str = env!("BUILD_TIME");
pub const GIT_COMMIT: &str = env!("GIT_COMMIT");

/// Default configuration values
pub mod defaults {
    use std::time::Duration;

    pub const DEFAULT_PING_COUNT: u32 = 1;
    pub const MAX_PING_COUNT: u32 = 100;
    pub const DEFAULT_SPEEDTEST_RUNS: u32 = 2;
    pub const MAX_SPEEDTEST_RUNS: u32 = 20;
    pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);
    pub const DEFAULT_ENABLE_COLOR: bool = true;

    /// Splunk management endpoint hosting the KV store
    pub const DEFAULT_KVSTORE_URL: &str = "https://127.0.0.1:8089";
    pub const DEFAULT_KVSTORE_APP: &str = "network_tools";
    pub const DEFAULT_KVSTORE_COLLECTION: &str = "network_hosts";

    /// Spool path relative to `SPLUNK_HOME`
    pub const SPOOL_SUBDIR: &str = "var/spool/splunk";
    pub const FALLBACK_SPOOL_DIR: &str = "spool";
    pub const STASH_FILE_EXTENSION: &str = "stash_output";

    pub const SPEEDTEST_DIRECTORY_URL: &str = "http://c.speedtest.net";

    pub const WOL_BROADCAST_ADDRESS: &str = "255.255.255.255";
    pub const WOL_DEFAULT_PORT: u16 = 9;
}
