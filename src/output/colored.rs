//! Colored formatter implementation with terminal color support
//!
//! Tables are laid out by the plain formatter and painted line by line, so
//! ANSI codes never disturb column widths.

use super::formatter::{FormattingOptions, OutputFormatter, PlainFormatter, RowData, TableFormat, TableLine};
use crate::{
    error::Result,
    models::{PingResult, SpeedtestResult, TracerouteResult, WakeOnLanResult},
};
use colored::*;

/// Latency classification for color coding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LatencyLevel {
    Excellent,  // < 20ms
    Good,       // 20-50ms
    Fair,       // 50-150ms
    Poor,       // 150-500ms
    VeryPoor,   // > 500ms
}

impl LatencyLevel {
    pub fn from_ms(time_ms: f64) -> Self {
        if time_ms < 20.0 {
            Self::Excellent
        } else if time_ms < 50.0 {
            Self::Good
        } else if time_ms < 150.0 {
            Self::Fair
        } else if time_ms < 500.0 {
            Self::Poor
        } else {
            Self::VeryPoor
        }
    }

    pub fn color(&self) -> Color {
        match self {
            Self::Excellent => Color::Green,
            Self::Good => Color::Cyan,
            Self::Fair => Color::Yellow,
            Self::Poor => Color::Magenta,
            Self::VeryPoor => Color::Red,
        }
    }
}

/// Color scheme configuration
#[derive(Debug, Clone)]
pub struct ColorScheme {
    pub header: Color,
    pub success: Color,
    pub warning: Color,
    pub error: Color,
    pub muted: Color,
    pub border: Color,
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self {
            header: Color::Blue,
            success: Color::Green,
            warning: Color::Yellow,
            error: Color::Red,
            muted: Color::BrightBlack,
            border: Color::BrightBlack,
        }
    }
}

pub struct ColoredFormatter {
    plain_formatter: PlainFormatter,
    options: FormattingOptions,
    color_scheme: ColorScheme,
}

impl ColoredFormatter {
    pub fn new(options: FormattingOptions) -> Self {
        Self {
            plain_formatter: PlainFormatter::new(options.clone()),
            options,
            color_scheme: ColorScheme::default(),
        }
    }

    /// Apply color to text if colors are enabled
    fn colorize(&self, text: &str, color: Color) -> ColoredString {
        if self.options.enable_color {
            text.color(color)
        } else {
            text.normal()
        }
    }

    fn title(&self, text: &str) -> String {
        if self.options.enable_color {
            text.bold().color(self.color_scheme.header).to_string()
        } else {
            text.to_string()
        }
    }

    fn loss_color(&self, packet_loss: f64) -> Color {
        if packet_loss <= 0.0 {
            self.color_scheme.success
        } else if packet_loss < 100.0 {
            self.color_scheme.warning
        } else {
            self.color_scheme.error
        }
    }

    /// Lay out a table and paint each line with `row_color`
    fn paint_table<F>(&self, format: &TableFormat, rows: &[RowData], row_color: F) -> String
    where
        F: Fn(usize) -> Option<Color>,
    {
        format
            .layout(rows)
            .iter()
            .map(|line| match line {
                TableLine::Border(text) => self.colorize(text, self.color_scheme.border).to_string(),
                TableLine::Header(text) => {
                    if self.options.enable_color {
                        text.bold().to_string()
                    } else {
                        text.clone()
                    }
                }
                TableLine::Row(idx, text) => match row_color(*idx) {
                    Some(color) => self.colorize(text, color).to_string(),
                    None => text.clone(),
                },
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl OutputFormatter for ColoredFormatter {
    fn format_ping(&self, result: &PingResult) -> Result<String> {
        let mut output = self.title(&format!("PING {}", result.host));
        output.push('\n');

        let rows = PlainFormatter::ping_rows(result);
        let loss_color = result.stats.as_ref().map(|s| self.loss_color(s.packet_loss));
        let latency_color = result
            .stats
            .as_ref()
            .and_then(|s| s.avgping)
            .map(|avg| LatencyLevel::from_ms(avg).color());

        output.push_str(&self.paint_table(&self.plain_formatter.key_value_format(), &rows, |idx| {
            match rows[idx][0].as_str() {
                "Packet loss" => loss_color,
                "Avg" => latency_color,
                "Return code" if !result.is_success() => Some(self.color_scheme.error),
                _ => None,
            }
        }));

        if result.stats.is_none() {
            output.push('\n');
            output.push_str(&self.format_warning("Unable to parse ping output")?);
        }
        if self.options.verbose_mode || result.stats.is_none() {
            output.push_str(&self.plain_formatter.raw_output_section(&result.output)?);
        }
        Ok(output)
    }

    fn format_traceroute(&self, result: &TracerouteResult) -> Result<String> {
        let mut output = self.title(&format!(
            "TRACEROUTE {} ({})",
            result.dest_host.as_deref().unwrap_or(&result.host),
            result.dest_ip.as_deref().unwrap_or("?")
        ));
        output.push('\n');

        let rows = PlainFormatter::hop_rows(result);
        output.push_str(&self.paint_table(&self.plain_formatter.hop_format(), &rows, |idx| {
            let hop = &result.hops[idx];
            let rtts: Vec<f64> = hop.rtt.iter().filter_map(|r| r.parse().ok()).collect();
            if rtts.is_empty() {
                Some(self.color_scheme.muted)
            } else {
                let avg = rtts.iter().sum::<f64>() / rtts.len() as f64;
                Some(LatencyLevel::from_ms(avg).color())
            }
        }));

        if let Some(unique_id) = &result.unique_id {
            output.push('\n');
            output.push_str(&self.colorize(&format!("unique_id: {}", unique_id), self.color_scheme.muted).to_string());
        }
        if self.options.verbose_mode {
            output.push_str(&self.plain_formatter.raw_output_section(&result.output)?);
        }
        Ok(output)
    }

    fn format_speedtest(&self, result: &SpeedtestResult) -> Result<String> {
        let mut output = self.title("SPEEDTEST");
        output.push('\n');

        let rows = PlainFormatter::speedtest_rows(result);
        let ping_color = LatencyLevel::from_ms(result.ping).color();
        output.push_str(&self.paint_table(&self.plain_formatter.key_value_format(), &rows, |idx| {
            match rows[idx][0].as_str() {
                "Ping" => Some(ping_color),
                "Download" | "Upload" => Some(self.color_scheme.success),
                _ => None,
            }
        }));
        Ok(output)
    }

    fn format_wakeonlan(&self, result: &WakeOnLanResult) -> Result<String> {
        let mut output = self.format_success(&result.message)?;
        output.push('\n');
        let rows = PlainFormatter::wakeonlan_rows(result);
        output.push_str(&self.paint_table(&self.plain_formatter.key_value_format(), &rows, |_| None));
        Ok(output)
    }

    fn format_warning(&self, warning: &str) -> Result<String> {
        Ok(format!("{} {}", self.colorize("!", self.color_scheme.warning), self.colorize(warning, self.color_scheme.warning)))
    }

    fn format_success(&self, message: &str) -> Result<String> {
        Ok(format!("{} {}", self.colorize("✓", self.color_scheme.success), self.colorize(message, self.color_scheme.success)))
    }
}

/// Helper functions for color management
impl ColoredFormatter {
    /// Check if terminal supports colors
    pub fn supports_color() -> bool {
        std::env::var("NO_COLOR").is_err() && std::env::var("TERM").map(|term| term != "dumb").unwrap_or(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PingStats;

    fn sample_ping(packet_loss: f64) -> PingResult {
        PingResult {
            host: "example.com".to_string(),
            output: String::new(),
            return_code: 0,
            stats: Some(PingStats {
                host: "example.com".to_string(),
                sent: 4,
                received: 4,
                packet_loss,
                minping: Some(9.0),
                avgping: Some(10.0),
                maxping: Some(11.0),
                jitter: Some(0.5),
            }),
        }
    }

    #[test]
    fn test_latency_levels() {
        assert_eq!(LatencyLevel::from_ms(5.0), LatencyLevel::Excellent);
        assert_eq!(LatencyLevel::from_ms(30.0), LatencyLevel::Good);
        assert_eq!(LatencyLevel::from_ms(100.0), LatencyLevel::Fair);
        assert_eq!(LatencyLevel::from_ms(200.0), LatencyLevel::Poor);
        assert_eq!(LatencyLevel::from_ms(900.0), LatencyLevel::VeryPoor);
    }

    #[test]
    fn test_disabled_colors_match_plain_layout() {
        let options = FormattingOptions {
            enable_color: false,
            ..Default::default()
        };
        let colored = ColoredFormatter::new(options.clone()).format_ping(&sample_ping(0.0)).unwrap();
        let plain = PlainFormatter::new(options).format_ping(&sample_ping(0.0)).unwrap();

        assert_eq!(colored, plain);
    }

    #[test]
    fn test_loss_color_thresholds() {
        let formatter = ColoredFormatter::new(FormattingOptions::default());
        assert_eq!(formatter.loss_color(0.0), Color::Green);
        assert_eq!(formatter.loss_color(25.0), Color::Yellow);
        assert_eq!(formatter.loss_color(100.0), Color::Red);
    }

    #[test]
    fn test_success_marker() {
        let options = FormattingOptions {
            enable_color: false,
            ..Default::default()
        };
        let text = ColoredFormatter::new(options).format_success("sent").unwrap();
        assert_eq!(text, "✓ sent");
    }
}
