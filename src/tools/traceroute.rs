use super::{EmitOptions, ToolContext};
use crate::{
    error::{AppError, Result},
    executor::CommandSpec,
    models::{TracerouteHop, TracerouteResult},
    parsers::{ParsedTraceroute, TracerouteParser},
};
use uuid::Uuid;

pub const DEFAULT_SOURCETYPE: &str = "traceroute";
pub const DEFAULT_SOURCE: &str = "traceroute_search_command";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracerouteRequest {
    pub host: String,
    /// Correlation id for emitted hops; generated when absent
    pub unique_id: Option<String>,
    /// Put `dest_ip`/`dest_host` on every returned hop
    pub include_dest_info: bool,
    pub emit: EmitOptions,
}

impl TracerouteRequest {
    pub fn new<S: Into<String>>(host: S) -> Self {
        Self {
            host: host.into(),
            unique_id: None,
            include_dest_info: true,
            emit: EmitOptions::default(),
        }
    }
}

/// Eight random hex characters
pub fn generate_unique_id() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}

/// Collapse parsed hops into records, skipping hops without probes
pub fn build_hops(parsed: &ParsedTraceroute, include_dest_info: bool) -> Vec<TracerouteHop> {
    parsed
        .hops
        .iter()
        .filter(|raw| !raw.probes.is_empty())
        .enumerate()
        .map(|(i, raw)| {
            let mut hop = TracerouteHop {
                hop: i as u32 + 1,
                rtt: Vec::new(),
                ip: Vec::new(),
                name: Vec::new(),
                dest_ip: None,
                dest_host: None,
            };

            for probe in &raw.probes {
                if let Some(rtt) = &probe.rtt {
                    hop.rtt.push(rtt.clone());
                }
                if let Some(ip) = &probe.ip {
                    hop.ip.push(ip.clone());
                }
                if let Some(name) = &probe.name {
                    hop.name.push(name.clone());
                }
            }

            if include_dest_info {
                hop.dest_ip = Some(parsed.dest_ip.clone());
                hop.dest_host = Some(parsed.dest_name.clone());
            }
            hop
        })
        .collect()
}

/// Trace the route to a host with the system binary
///
/// Output that cannot be parsed fails the call.
pub async fn traceroute(ctx: &ToolContext, request: &TracerouteRequest) -> Result<TracerouteResult> {
    let host = request.host.trim();
    if host.is_empty() {
        return Err(AppError::validation("A host to trace is required"));
    }
    if host.starts_with('-') {
        return Err(AppError::validation(format!("Invalid host '{}': must not start with '-'", host)));
    }

    let meta = request.emit.meta(DEFAULT_SOURCETYPE, DEFAULT_SOURCE)?;

    let spec = CommandSpec::new("traceroute").arg(host);
    let output = ctx.runner.run(&spec).await?;
    ctx.logger.debug("traceroute finished").command(&spec, &output).log().await;

    let parsed = TracerouteParser::shared()?
        .parse(&output.output)
        .map_err(|e| AppError::parse(format!("Unable to parse traceroute output: {}", e)))?;

    let hops = build_hops(&parsed, request.include_dest_info);

    let mut result = TracerouteResult {
        host: host.to_string(),
        output: output.output,
        return_code: output.return_code,
        hops,
        dest_ip: Some(parsed.dest_ip),
        dest_host: Some(parsed.dest_name),
        unique_id: None,
    };

    if let Some(meta) = &meta {
        let unique_id = request.unique_id.clone().unwrap_or_else(generate_unique_id);

        for hop in &result.hops {
            let mut event = hop.to_event();
            if !request.include_dest_info {
                event.push("dest_ip", &result.dest_ip);
                event.push("dest_host", &result.dest_host);
            }
            event.push("unique_id", &unique_id);
            ctx.emit(meta, &event).await?;
        }

        result.unique_id = Some(unique_id);
    }

    Ok(result)
}
