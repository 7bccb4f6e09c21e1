//! `traceroute` output parser
//!
//! ```text
//! traceroute to example.com (93.184.216.34), 30 hops max, 60 byte packets
//!  1  gateway (192.168.1.1)  0.420 ms  0.385 ms  0.416 ms
//!  2  * * *
//!  3  a.example.net (10.0.0.1)  9.301 ms b.example.net (10.0.0.2)  10.118 ms *
//!     c.example.net (10.0.0.3)  11.2 ms
//! ```
//!
//! Every RTT is one probe. A probe inherits the name/address printed most
//! recently on its hop, so the per-hop lists stay aligned by probe. `*`
//! stands for a probe that got no answer.

use crate::error::{AppError, Result};
use regex::Regex;
use std::net::IpAddr;
use std::sync::LazyLock;

static SHARED: LazyLock<std::result::Result<TracerouteParser, regex::Error>> = LazyLock::new(TracerouteParser::compile);

/// One probe of a hop
#[derive(Debug, Clone, PartialEq)]
pub struct Probe {
    pub name: Option<String>,
    pub ip: Option<String>,
    /// RTT token exactly as printed, without the `ms` unit
    pub rtt: Option<String>,
    /// ICMP annotation such as `!H` or `!N`
    pub annotation: Option<String>,
}

impl Probe {
    fn lost() -> Self {
        Self { name: None, ip: None, rtt: None, annotation: None }
    }
}

/// A hop line (plus any continuation lines) as printed by traceroute
#[derive(Debug, Clone, PartialEq)]
pub struct RawHop {
    pub idx: u32,
    pub probes: Vec<Probe>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedTraceroute {
    pub dest_name: String,
    pub dest_ip: String,
    pub hops: Vec<RawHop>,
}

pub struct TracerouteParser {
    header: Regex,
    hop_line: Regex,
}

impl TracerouteParser {
    /// Parser compiled once per process
    pub fn shared() -> Result<&'static Self> {
        SHARED.as_ref().map_err(|e| AppError::from(e.clone()))
    }

    fn compile() -> std::result::Result<Self, regex::Error> {
        Ok(Self {
            header: Regex::new(r"^traceroute6?\s+to\s+(\S+)\s+\(([^)]+)\)")?,
            hop_line: Regex::new(r"^\s*(\d+)\s+(.*)$")?,
        })
    }

    pub fn parse(&self, output: &str) -> Result<ParsedTraceroute> {
        let mut lines = output.lines();

        // Resolver warnings may precede the header
        let (dest_name, dest_ip) = lines
            .by_ref()
            .find_map(|line| {
                self.header
                    .captures(line.trim_start())
                    .map(|c| (c[1].to_string(), c[2].to_string()))
            })
            .ok_or_else(|| AppError::parse("traceroute output has no 'traceroute to' header"))?;

        let mut hops: Vec<RawHop> = Vec::new();

        for line in lines {
            if line.trim().is_empty() {
                continue;
            }

            if let Some(caps) = self.hop_line.captures(line) {
                let idx: u32 = caps[1].parse()?;
                let probes = parse_probes(&caps[2], &mut None)?;
                hops.push(RawHop { idx, probes });
            } else if let Some(hop) = hops.last_mut() {
                // Continuation line: more probes for the previous hop, answered by another router
                let mut last_seen = None;
                let more = parse_probes(line, &mut last_seen)?;
                hop.probes.extend(more);
            } else {
                return Err(AppError::parse(format!("Unexpected traceroute line: '{}'", line.trim())));
            }
        }

        Ok(ParsedTraceroute { dest_name, dest_ip, hops })
    }
}

/// Walk the tokens of a hop line and produce its probes
fn parse_probes(text: &str, last_seen: &mut Option<(String, Option<String>)>) -> Result<Vec<Probe>> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    let mut probes = Vec::new();
    let mut i = 0;

    while i < tokens.len() {
        let token = tokens[i];

        if token == "*" {
            probes.push(Probe::lost());
            i += 1;
            continue;
        }

        if token.starts_with('!') {
            if let Some(probe) = probes.last_mut() {
                probe.annotation = Some(token.to_string());
            }
            i += 1;
            continue;
        }

        if token.parse::<f64>().is_ok() && tokens.get(i + 1) == Some(&"ms") {
            let (name, ip) = match last_seen {
                Some((name, ip)) => (Some(name.clone()), ip.clone()),
                None => (None, None),
            };
            probes.push(Probe { name, ip, rtt: Some(token.to_string()), annotation: None });
            i += 2;
            continue;
        }

        // A responder: `name (ip)` or a bare address when run with -n
        match tokens.get(i + 1).and_then(|t| t.strip_prefix('(')).and_then(|t| t.strip_suffix(')')) {
            Some(ip) => {
                *last_seen = Some((token.to_string(), Some(ip.to_string())));
                i += 2;
            }
            None => {
                let ip = token.parse::<IpAddr>().ok().map(|_| token.to_string());
                if ip.is_none() && token.parse::<f64>().is_ok() {
                    return Err(AppError::parse(format!("RTT without unit in traceroute line: '{}'", text.trim())));
                }
                *last_seen = Some((token.to_string(), ip));
                i += 1;
            }
        }
    }

    Ok(probes)
}
