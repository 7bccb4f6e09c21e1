//! Result records produced by the four tools

use crate::sink::StashEvent;
use crate::types::MacAddress;
use serde::{Deserialize, Deserializer, Serialize};

/// Host metadata stored in the KV store hosts collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostRecord {
    pub name: String,

    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub mac_address: Option<String>,

    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub ip_address: Option<String>,

    /// The store keeps whatever the user typed, so numbers and strings both occur
    #[serde(default, deserialize_with = "port_from_number_or_string")]
    pub port: Option<u16>,
}

fn empty_string_as_none<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.and_then(|s| {
        let trimmed = s.trim();
        if trimmed.is_empty() { None } else { Some(trimmed.to_string()) }
    }))
}

fn port_from_number_or_string<'de, D>(deserializer: D) -> std::result::Result<Option<u16>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::Number(n)) => n
            .as_u64()
            .and_then(|p| u16::try_from(p).ok())
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("port out of range: {}", n))),
        Some(serde_json::Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(serde_json::Value::String(s)) => s
            .trim()
            .parse::<u16>()
            .map(Some)
            .map_err(|e| D::Error::custom(format!("invalid port '{}': {}", s, e))),
        Some(other) => Err(D::Error::custom(format!("unexpected port value: {}", other))),
    }
}

/// Summary statistics extracted from `ping` output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PingStats {
    /// Host as reported in the statistics footer
    pub host: String,
    pub sent: u32,
    pub received: u32,
    /// Percentage of lost packets
    pub packet_loss: f64,
    pub minping: Option<f64>,
    pub avgping: Option<f64>,
    pub maxping: Option<f64>,
    /// mdev / stddev, when the platform reports it
    pub jitter: Option<f64>,
}

/// Outcome of one ping invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PingResult {
    /// Host as requested on the command line
    pub host: String,
    pub output: String,
    pub return_code: i32,
    /// `None` when the output could not be parsed
    pub stats: Option<PingStats>,
}

impl PingResult {
    pub fn is_success(&self) -> bool {
        self.return_code == 0
    }

    /// Build the indexed record: parsed fields with `host` renamed to `dest`
    pub fn to_event(&self) -> StashEvent {
        let mut event = StashEvent::new();

        match &self.stats {
            Some(stats) => {
                event.push("dest", &stats.host);
                event.push("sent", stats.sent);
                event.push("received", stats.received);
                event.push("packet_loss", stats.packet_loss);
                event.push("minping", stats.minping);
                event.push("maxping", stats.maxping);
                event.push("avgping", stats.avgping);
                event.push("jitter", stats.jitter);
            }
            None => {
                event.push("dest", &self.host);
            }
        }

        event.push("return_code", self.return_code);
        event.push("output", &self.output);
        event
    }
}

/// One traceroute hop, with probe results aggregated into lists
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TracerouteHop {
    pub hop: u32,
    pub rtt: Vec<String>,
    pub ip: Vec<String>,
    pub name: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dest_ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dest_host: Option<String>,
}

impl TracerouteHop {
    pub fn to_event(&self) -> StashEvent {
        let mut event = StashEvent::new();
        event.push("hop", self.hop);
        event.push("rtt", &self.rtt);
        event.push("ip", &self.ip);
        event.push("name", &self.name);
        if self.dest_ip.is_some() || self.dest_host.is_some() {
            event.push("dest_ip", &self.dest_ip);
            event.push("dest_host", &self.dest_host);
        }
        event
    }
}

/// Outcome of one traceroute invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TracerouteResult {
    pub host: String,
    pub output: String,
    pub return_code: i32,
    pub hops: Vec<TracerouteHop>,
    pub dest_ip: Option<String>,
    pub dest_host: Option<String>,
    /// Correlation identifier shared by every emitted hop record
    pub unique_id: Option<String>,
}

/// Outcome of one bandwidth test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeedtestResult {
    /// Latency in milliseconds
    pub ping: f64,
    /// Bits per second
    pub download: f64,
    pub download_readable: String,
    /// Bits per second
    pub upload: f64,
    pub upload_readable: String,
    pub server: String,
}

impl SpeedtestResult {
    pub fn to_event(&self) -> StashEvent {
        let mut event = StashEvent::new();
        event.push("ping", self.ping);
        event.push("download", self.download);
        event.push("download_readable", &self.download_readable);
        event.push("upload", self.upload);
        event.push("upload_readable", &self.upload_readable);
        event.push("server", &self.server);
        event
    }
}

/// Confirmation that a magic packet went out
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WakeOnLanResult {
    pub message: String,
    pub mac_address: MacAddress,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

impl WakeOnLanResult {
    pub fn to_event(&self) -> StashEvent {
        let mut event = StashEvent::new();
        event.push("message", &self.message);
        event.push("mac_address", self.mac_address.to_string());
        event.push("ip_address", &self.ip_address);
        event.push("port", self.port);
        event
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_host_record_port_as_string_or_number() {
        let records: Vec<HostRecord> = serde_json::from_value(json!([
            {"_key": "1", "name": "nas", "mac_address": "00:11:22:33:44:55", "ip_address": "10.0.0.5", "port": "7"},
            {"_key": "2", "name": "desktop", "mac_address": "00:11:22:33:44:66", "port": 9},
            {"_key": "3", "name": "printer", "mac_address": "", "ip_address": "", "port": ""}
        ]))
        .unwrap();

        assert_eq!(records[0].port, Some(7));
        assert_eq!(records[1].port, Some(9));
        assert_eq!(records[1].ip_address, None);
        assert_eq!(records[2].mac_address, None);
        assert_eq!(records[2].port, None);
    }

    #[test]
    fn test_host_record_rejects_out_of_range_port() {
        let result: std::result::Result<HostRecord, _> =
            serde_json::from_value(json!({"name": "nas", "port": 70000}));
        assert!(result.is_err());
    }

    #[test]
    fn test_ping_event_renames_host_to_dest() {
        let result = PingResult {
            host: "example.com".to_string(),
            output: "raw".to_string(),
            return_code: 0,
            stats: Some(PingStats {
                host: "example.com".to_string(),
                sent: 1,
                received: 1,
                packet_loss: 0.0,
                minping: Some(10.5),
                avgping: Some(10.5),
                maxping: Some(10.5),
                jitter: Some(0.0),
            }),
        };

        let event = result.to_event();
        assert_eq!(event.get("dest"), Some(&json!("example.com")));
        assert!(event.get("host").is_none());
        assert_eq!(event.get("return_code"), Some(&json!(0)));
        assert_eq!(event.get("output"), Some(&json!("raw")));
    }

    #[test]
    fn test_ping_event_without_stats_uses_requested_host() {
        let result = PingResult {
            host: "unknown.invalid".to_string(),
            output: "ping: unknown host".to_string(),
            return_code: 2,
            stats: None,
        };

        let event = result.to_event();
        assert_eq!(event.get("dest"), Some(&json!("unknown.invalid")));
        assert_eq!(event.get("return_code"), Some(&json!(2)));
        assert!(event.get("sent").is_none());
    }

    #[test]
    fn test_wake_on_lan_result_omits_missing_fields() {
        let result = WakeOnLanResult {
            message: "sent".to_string(),
            mac_address: "00:11:22:33:44:55".parse().unwrap(),
            ip_address: None,
            port: None,
        };

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value, json!({"message": "sent", "mac_address": "00:11:22:33:44:55"}));
    }
}
