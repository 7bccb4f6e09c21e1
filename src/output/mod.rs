//! Terminal rendering of tool results
//!
//! Text output goes through an [`OutputFormatter`] (plain or colored);
//! `--format json` bypasses the formatters and prints the record itself.

mod colored;
mod formatter;

pub use self::colored::{ColorScheme, ColoredFormatter, LatencyLevel};
pub use self::formatter::{
    Alignment, Column, FormattingOptions, OutputFormatter, PlainFormatter, RowData, TableFormat, TableLine,
};

use crate::{
    error::Result,
    models::{PingResult, SpeedtestResult, TracerouteResult, WakeOnLanResult},
    types::OutputFormat,
};
use serde::Serialize;

/// Output formatting factory for creating appropriate formatters
pub struct OutputFormatterFactory;

impl OutputFormatterFactory {
    /// Create a formatter based on color support and preferences
    pub fn create_formatter(enable_color: bool, verbose: bool) -> Box<dyn OutputFormatter> {
        let options = FormattingOptions {
            enable_color,
            verbose_mode: verbose,
            ..Default::default()
        };

        if enable_color && ColoredFormatter::supports_color() {
            Box::new(ColoredFormatter::new(options))
        } else {
            Box::new(PlainFormatter::new(FormattingOptions {
                enable_color: false,
                ..options
            }))
        }
    }

    /// Create a plain text formatter for scripts/logs
    pub fn create_plain_formatter() -> Box<dyn OutputFormatter> {
        Self::create_formatter(false, false)
    }
}

/// Any result one of the tools can produce
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ToolOutput {
    Ping(PingResult),
    Traceroute(TracerouteResult),
    Speedtest(SpeedtestResult),
    WakeOnLan(WakeOnLanResult),
}

/// Renders tool results in the selected format
pub struct OutputCoordinator {
    formatter: Box<dyn OutputFormatter>,
    format: OutputFormat,
}

impl OutputCoordinator {
    pub fn new(formatter: Box<dyn OutputFormatter>, format: OutputFormat) -> Self {
        Self { formatter, format }
    }

    pub fn render(&self, output: &ToolOutput) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(output)?),
            OutputFormat::Text => match output {
                ToolOutput::Ping(result) => self.formatter.format_ping(result),
                ToolOutput::Traceroute(result) => self.formatter.format_traceroute(result),
                ToolOutput::Speedtest(result) => self.formatter.format_speedtest(result),
                ToolOutput::WakeOnLan(result) => self.formatter.format_wakeonlan(result),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn speedtest_output() -> ToolOutput {
        ToolOutput::Speedtest(SpeedtestResult {
            ping: 12.5,
            download: 1048576.0,
            download_readable: "1.00 Mbps".to_string(),
            upload: 2048.0,
            upload_readable: "2.00 Kbps".to_string(),
            server: "speed.example.net:8080".to_string(),
        })
    }

    #[test]
    fn test_json_rendering_is_the_bare_record() {
        let coordinator = OutputCoordinator::new(OutputFormatterFactory::create_plain_formatter(), OutputFormat::Json);
        let json: Value = serde_json::from_str(&coordinator.render(&speedtest_output()).unwrap()).unwrap();

        assert_eq!(json["download_readable"], "1.00 Mbps");
        assert_eq!(json["server"], "speed.example.net:8080");
        assert!(json.get("Speedtest").is_none());
    }

    #[test]
    fn test_text_rendering_uses_formatter() {
        let coordinator = OutputCoordinator::new(OutputFormatterFactory::create_plain_formatter(), OutputFormat::Text);
        let text = coordinator.render(&speedtest_output()).unwrap();

        assert!(text.starts_with("SPEEDTEST"));
        assert!(text.contains("| Download | 1.00 Mbps"));
    }
}
