//! `ping` summary parser
//!
//! Understands the iputils/BSD footer:
//!
//! ```text
//! --- example.com ping statistics ---
//! 3 packets transmitted, 3 received, 0% packet loss, time 2003ms
//! rtt min/avg/max/mdev = 10.101/10.345/10.612/0.209 ms
//! ```
//!
//! and the Windows one (`Packets: Sent = 4, Received = 4, Lost = 0 (0% loss)`).

use crate::error::{AppError, Result};
use crate::models::PingStats;
use regex::Regex;
use std::sync::LazyLock;

static SHARED: LazyLock<std::result::Result<PingParser, regex::Error>> = LazyLock::new(PingParser::compile);

pub struct PingParser {
    unix_host: Regex,
    unix_header: Regex,
    unix_counts: Regex,
    unix_rtt: Regex,
    windows_host: Regex,
    windows_header: Regex,
    windows_counts: Regex,
    windows_rtt: Regex,
}

impl PingParser {
    /// Parser compiled once per process
    pub fn shared() -> Result<&'static Self> {
        SHARED.as_ref().map_err(|e| AppError::from(e.clone()))
    }

    fn compile() -> std::result::Result<Self, regex::Error> {
        Ok(Self {
            unix_host: Regex::new(r"(?m)^---\s+(\S+)\s+ping statistics\s+---")?,
            unix_header: Regex::new(r"(?m)^PING\s+(\S+)")?,
            unix_counts: Regex::new(
                r"(\d+)\s+packets transmitted,\s+(\d+)\s+(?:packets\s+)?received,.*?([\d.]+)%\s+packet loss",
            )?,
            unix_rtt: Regex::new(
                r"(?:rtt|round-trip)\s+min/avg/max(?:/(?:mdev|stddev))?\s*=\s*([\d.]+)/([\d.]+)/([\d.]+)(?:/([\d.]+))?\s*ms",
            )?,
            windows_host: Regex::new(r"(?m)^Ping statistics for\s+(\S+?):?\s*$")?,
            windows_header: Regex::new(r"(?m)^Pinging\s+(\S+)")?,
            windows_counts: Regex::new(
                r"Sent\s*=\s*(\d+),\s*Received\s*=\s*(\d+),\s*Lost\s*=\s*\d+\s*\((\d+)%\s*loss\)",
            )?,
            windows_rtt: Regex::new(
                r"Minimum\s*=\s*(\d+)ms,\s*Maximum\s*=\s*(\d+)ms,\s*Average\s*=\s*(\d+)ms",
            )?,
        })
    }

    /// Extract summary statistics, failing when the summary is missing
    pub fn parse(&self, output: &str) -> Result<PingStats> {
        if let Some(counts) = self.unix_counts.captures(output) {
            let host = self
                .unix_host
                .captures(output)
                .or_else(|| self.unix_header.captures(output))
                .map(|c| c[1].to_string())
                .ok_or_else(|| AppError::parse("ping output does not name the destination host"))?;

            let mut stats = PingStats {
                host,
                sent: counts[1].parse()?,
                received: counts[2].parse()?,
                packet_loss: counts[3].parse()?,
                minping: None,
                avgping: None,
                maxping: None,
                jitter: None,
            };

            if let Some(rtt) = self.unix_rtt.captures(output) {
                stats.minping = Some(rtt[1].parse()?);
                stats.avgping = Some(rtt[2].parse()?);
                stats.maxping = Some(rtt[3].parse()?);
                stats.jitter = rtt.get(4).map(|m| m.as_str().parse::<f64>()).transpose()?;
            }

            return Ok(stats);
        }

        if let Some(counts) = self.windows_counts.captures(output) {
            let host = self
                .windows_host
                .captures(output)
                .or_else(|| self.windows_header.captures(output))
                .map(|c| c[1].to_string())
                .ok_or_else(|| AppError::parse("ping output does not name the destination host"))?;

            let mut stats = PingStats {
                host,
                sent: counts[1].parse()?,
                received: counts[2].parse()?,
                packet_loss: counts[3].parse()?,
                minping: None,
                avgping: None,
                maxping: None,
                jitter: None,
            };

            if let Some(rtt) = self.windows_rtt.captures(output) {
                stats.minping = Some(rtt[1].parse()?);
                stats.maxping = Some(rtt[2].parse()?);
                stats.avgping = Some(rtt[3].parse()?);
            }

            return Ok(stats);
        }

        Err(AppError::parse("ping output has no packet statistics"))
    }
}
