//! Main application orchestration and execution

use crate::{
    cli::{Cli, Commands},
    client::KvStoreClient,
    config::{display_config_summary, load_config},
    error::{AppError, Result},
    logging::Logger,
    models::Config,
    output::{OutputCoordinator, OutputFormatterFactory, ToolOutput},
    tools::{self, ToolContext},
};
use std::sync::Arc;

/// Main application struct that coordinates all components
pub struct App {
    command: Commands,
    config: Config,
    logger: Logger,
}

impl App {
    /// Validate the command line and load configuration
    pub fn new(cli: Cli) -> Result<Self> {
        cli.validate().map_err(AppError::validation)?;

        let command = cli
            .command
            .clone()
            .ok_or_else(|| AppError::validation("A subcommand is required"))?;
        let config = load_config(&cli)?;
        let logger = Logger::with_config("NETTOOLS", &config);

        Ok(Self { command, config, logger })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Tool collaborators; the KV store client is only built when a lookup is needed
    pub fn build_context(&self) -> Result<ToolContext> {
        let mut ctx = ToolContext::new(self.config.clone(), self.logger.clone());
        if self.command.needs_host_directory() {
            let client = KvStoreClient::from_config(&self.config, &self.logger)?;
            ctx = ctx.with_hosts(Arc::new(client));
        }
        Ok(ctx)
    }

    /// Run the selected tool and render its result
    pub async fn run(&self) -> Result<String> {
        let session_id = self.logger.start_session().await;
        self.logger.add_context_field("command", self.command.name()).await;

        if self.config.debug {
            self.logger
                .debug("Configuration loaded")
                .field("summary", display_config_summary(&self.config))
                .correlation_id(&session_id)
                .log()
                .await;
        }

        let ctx = self.build_context()?;
        let output = Self::execute(&ctx, &self.command).await?;

        let formatter = OutputFormatterFactory::create_formatter(self.config.enable_color, self.config.verbose);
        OutputCoordinator::new(formatter, self.config.output_format).render(&output)
    }

    /// Dispatch one subcommand to its tool
    pub async fn execute(ctx: &ToolContext, command: &Commands) -> Result<ToolOutput> {
        let output = match command {
            Commands::Ping { .. } => {
                let request = command.ping_request().ok_or_else(|| AppError::internal("ping request"))?;
                ToolOutput::Ping(tools::ping(ctx, &request).await?)
            }
            Commands::Traceroute { .. } => {
                let request = command
                    .traceroute_request()
                    .ok_or_else(|| AppError::internal("traceroute request"))?;
                ToolOutput::Traceroute(tools::traceroute(ctx, &request).await?)
            }
            Commands::Speedtest { .. } => {
                let request = command
                    .speedtest_request()
                    .ok_or_else(|| AppError::internal("speedtest request"))?;
                ToolOutput::Speedtest(tools::speedtest(ctx, &request).await?)
            }
            Commands::WakeOnLan { .. } => {
                let request = command
                    .wakeonlan_request()
                    .ok_or_else(|| AppError::internal("wakeonlan request"))?;
                ToolOutput::WakeOnLan(tools::wake_on_lan(ctx, &request).await?)
            }
        };

        Ok(output)
    }
}
