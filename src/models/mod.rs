//! Data models and structures for the network tools

pub mod config;
pub mod records;

// Re-export main model types
pub use config::Config;
pub use records::{
    HostRecord, PingResult, PingStats, SpeedtestResult, TracerouteHop, TracerouteResult,
    WakeOnLanResult,
};
