use super::{EmitOptions, ToolContext};
use crate::{
    defaults::{DEFAULT_SPEEDTEST_RUNS, MAX_SPEEDTEST_RUNS},
    error::{AppError, Result},
    models::SpeedtestResult,
    speedtest::{pretty_speed, round2, SpeedTest},
};

pub const DEFAULT_SOURCETYPE: &str = "speedtest";
pub const DEFAULT_SOURCE: &str = "speedtest_search_command";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeedtestRequest {
    /// `host[:port]` of the server; the closest one is picked when absent
    pub server: Option<String>,
    pub runs: u32,
    pub emit: EmitOptions,
}

impl Default for SpeedtestRequest {
    fn default() -> Self {
        Self {
            server: None,
            runs: DEFAULT_SPEEDTEST_RUNS,
            emit: EmitOptions::default(),
        }
    }
}

/// Measure latency, download and upload against one server
pub async fn speedtest(ctx: &ToolContext, request: &SpeedtestRequest) -> Result<SpeedtestResult> {
    if !(1..=MAX_SPEEDTEST_RUNS).contains(&request.runs) {
        return Err(AppError::validation(format!(
            "Speedtest runs must be between 1 and {}, got {}",
            MAX_SPEEDTEST_RUNS, request.runs
        )));
    }

    let meta = request.emit.meta(DEFAULT_SOURCETYPE, DEFAULT_SOURCE)?;

    let client = SpeedTest::new(request.server.clone(), request.runs, &ctx.config, &ctx.logger)?;
    let server = client.resolve_host().await?;
    ctx.logger.info("Running speedtest").field("server", &server).log().await;

    let ping = client.ping(&server).await?;
    let download = client.download(&server).await?;
    let upload = client.upload(&server).await?;

    let result = SpeedtestResult {
        ping: round2(ping),
        download: round2(download),
        download_readable: pretty_speed(download),
        upload: round2(upload),
        upload_readable: pretty_speed(upload),
        server,
    };

    if let Some(meta) = &meta {
        ctx.emit(meta, &result.to_event()).await?;
    }

    Ok(result)
}
