use super::{EmitOptions, ToolContext};
use crate::{
    defaults::{DEFAULT_PING_COUNT, MAX_PING_COUNT},
    error::{AppError, Result},
    executor::CommandSpec,
    models::PingResult,
    parsers::PingParser,
};

pub const DEFAULT_SOURCETYPE: &str = "ping";
pub const DEFAULT_SOURCE: &str = "ping_search_command";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PingRequest {
    pub host: String,
    pub count: u32,
    pub emit: EmitOptions,
}

impl PingRequest {
    pub fn new<S: Into<String>>(host: S) -> Self {
        Self {
            host: host.into(),
            count: DEFAULT_PING_COUNT,
            emit: EmitOptions::default(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        let host = self.host.trim();
        if host.is_empty() {
            return Err(AppError::validation("A host to ping is required"));
        }
        if host.starts_with('-') {
            return Err(AppError::validation(format!("Invalid host '{}': must not start with '-'", host)));
        }
        if !(1..=MAX_PING_COUNT).contains(&self.count) {
            return Err(AppError::validation(format!(
                "Ping count must be between 1 and {}, got {}",
                MAX_PING_COUNT, self.count
            )));
        }
        Ok(())
    }
}

/// Ping a host with the system binary
///
/// A non-zero exit status is reported in the result. Output that cannot be
/// parsed leaves `stats` empty instead of failing the call.
pub async fn ping(ctx: &ToolContext, request: &PingRequest) -> Result<PingResult> {
    request.validate()?;
    let meta = request.emit.meta(DEFAULT_SOURCETYPE, DEFAULT_SOURCE)?;

    let spec = CommandSpec::new("ping")
        .arg(ctx.platform.ping_count_flag())
        .arg(request.count.to_string())
        .arg(request.host.trim());

    let output = ctx.runner.run(&spec).await?;
    ctx.logger.debug("ping finished").command(&spec, &output).log().await;

    let stats = match PingParser::shared()?.parse(&output.output) {
        Ok(stats) => Some(stats),
        Err(e) => {
            ctx.logger
                .debug("Unable to parse ping output")
                .field("host", &request.host)
                .error_info(&e)
                .log()
                .await;
            None
        }
    };

    let result = PingResult {
        host: request.host.trim().to_string(),
        output: output.output,
        return_code: output.return_code,
        stats,
    };

    if let Some(meta) = &meta {
        ctx.emit(meta, &result.to_event()).await?;
    }

    Ok(result)
}
