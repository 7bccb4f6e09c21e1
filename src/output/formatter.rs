//! Core formatting trait and the plain text implementation
//!
//! Results are laid out as small bordered tables. The table layout is
//! shared with the colored formatter, which paints the finished lines.

use crate::{
    error::{AppError, Result},
    models::{PingResult, SpeedtestResult, TracerouteResult, WakeOnLanResult},
};
use std::fmt::Write as _;

/// Rendering of tool results for the terminal
pub trait OutputFormatter {
    fn format_ping(&self, result: &PingResult) -> Result<String>;

    fn format_traceroute(&self, result: &TracerouteResult) -> Result<String>;

    fn format_speedtest(&self, result: &SpeedtestResult) -> Result<String>;

    fn format_wakeonlan(&self, result: &WakeOnLanResult) -> Result<String>;

    fn format_warning(&self, warning: &str) -> Result<String>;

    fn format_success(&self, message: &str) -> Result<String>;
}

/// Configuration options for formatting
#[derive(Debug, Clone)]
pub struct FormattingOptions {
    pub enable_color: bool,
    /// Append the raw tool output below the tables
    pub verbose_mode: bool,
    pub table_borders: bool,
    /// Cells wider than this are truncated
    pub max_column_width: usize,
}

impl Default for FormattingOptions {
    fn default() -> Self {
        Self {
            enable_color: true,
            verbose_mode: false,
            table_borders: true,
            max_column_width: 60,
        }
    }
}

/// Text alignment options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    Left,
    Right,
}

/// Column definition for table formatting
#[derive(Debug, Clone)]
pub struct Column {
    pub header: String,
    pub alignment: Alignment,
}

impl Column {
    pub fn left(header: &str) -> Self {
        Self { header: header.to_string(), alignment: Alignment::Left }
    }

    pub fn right(header: &str) -> Self {
        Self { header: header.to_string(), alignment: Alignment::Right }
    }
}

/// Row data for table formatting
pub type RowData = Vec<String>;

/// Table formatting configuration
#[derive(Debug, Clone)]
pub struct TableFormat {
    pub columns: Vec<Column>,
    pub show_borders: bool,
    pub show_header: bool,
    pub max_column_width: usize,
}

/// One rendered table line, tagged so it can be styled afterwards
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableLine {
    Border(String),
    Header(String),
    /// A data row with its index into the input rows
    Row(usize, String),
}

impl TableLine {
    pub fn text(&self) -> &str {
        match self {
            Self::Border(text) | Self::Header(text) | Self::Row(_, text) => text,
        }
    }
}

impl TableFormat {
    /// Lay out `rows`, sizing each column to its widest cell
    pub fn layout(&self, rows: &[RowData]) -> Vec<TableLine> {
        let widths = self.column_widths(rows);
        let mut lines = Vec::new();

        if self.show_header && !self.columns.is_empty() {
            if self.show_borders {
                lines.push(TableLine::Border(self.horizontal_border(&widths)));
            }
            let headers: Vec<String> = self.columns.iter().map(|c| c.header.clone()).collect();
            lines.push(TableLine::Header(self.row(&headers, &widths)));
        }

        if self.show_borders {
            lines.push(TableLine::Border(self.horizontal_border(&widths)));
        }

        for (idx, row) in rows.iter().enumerate() {
            lines.push(TableLine::Row(idx, self.row(row, &widths)));
        }

        if self.show_borders {
            lines.push(TableLine::Border(self.horizontal_border(&widths)));
        }

        lines
    }

    fn column_widths(&self, rows: &[RowData]) -> Vec<usize> {
        let num_columns = self.columns.len().max(rows.iter().map(|r| r.len()).max().unwrap_or(0));

        (0..num_columns)
            .map(|idx| {
                let header = self.columns.get(idx).map_or(0, |c| c.header.chars().count());
                let content = rows
                    .iter()
                    .filter_map(|r| r.get(idx))
                    .map(|cell| cell.chars().count())
                    .max()
                    .unwrap_or(0);
                header.max(content).min(self.max_column_width)
            })
            .collect()
    }

    fn row(&self, cells: &[String], widths: &[usize]) -> String {
        let mut row = String::new();
        if self.show_borders {
            row.push('|');
        }

        for (idx, &width) in widths.iter().enumerate() {
            let cell = cells.get(idx).map(String::as_str).unwrap_or("");
            let alignment = self.columns.get(idx).map_or(Alignment::Left, |c| c.alignment);
            let padded = align_text(cell, width, alignment);

            if self.show_borders {
                row.push(' ');
                row.push_str(&padded);
                row.push_str(" |");
            } else {
                row.push_str(&padded);
                row.push_str("  ");
            }
        }

        row.trim_end().to_string()
    }

    fn horizontal_border(&self, widths: &[usize]) -> String {
        let mut border = String::from("+");
        for &width in widths {
            border.push_str(&"-".repeat(width + 2));
            border.push('+');
        }
        border
    }
}

fn align_text(text: &str, width: usize, alignment: Alignment) -> String {
    let len = text.chars().count();
    if len >= width {
        return text.chars().take(width).collect();
    }

    let padding = " ".repeat(width - len);
    match alignment {
        Alignment::Left => format!("{}{}", text, padding),
        Alignment::Right => format!("{}{}", padding, text),
    }
}

pub(crate) fn format_ms(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{:.3} ms", v))
}

pub(crate) fn format_percentage(percentage: f64) -> String {
    format!("{:.1}%", percentage)
}

/// Distinct values in first-seen order, comma separated
pub(crate) fn join_distinct(values: &[String]) -> String {
    let mut seen: Vec<&str> = Vec::new();
    for value in values {
        if !seen.contains(&value.as_str()) {
            seen.push(value);
        }
    }
    if seen.is_empty() {
        "*".to_string()
    } else {
        seen.join(", ")
    }
}

/// Plain text formatter implementation
pub struct PlainFormatter {
    options: FormattingOptions,
}

impl PlainFormatter {
    pub fn new(options: FormattingOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &FormattingOptions {
        &self.options
    }

    pub(crate) fn key_value_format(&self) -> TableFormat {
        TableFormat {
            columns: vec![Column::left("Field"), Column::left("Value")],
            show_borders: self.options.table_borders,
            show_header: false,
            max_column_width: self.options.max_column_width,
        }
    }

    pub(crate) fn hop_format(&self) -> TableFormat {
        TableFormat {
            columns: vec![
                Column::right("Hop"),
                Column::left("Name"),
                Column::left("IP"),
                Column::right("RTT (ms)"),
            ],
            show_borders: self.options.table_borders,
            show_header: true,
            max_column_width: self.options.max_column_width,
        }
    }

    pub(crate) fn ping_rows(result: &PingResult) -> Vec<RowData> {
        let mut rows = vec![vec!["Destination".to_string(), result.host.clone()]];
        if let Some(stats) = &result.stats {
            rows.push(vec!["Sent".to_string(), stats.sent.to_string()]);
            rows.push(vec!["Received".to_string(), stats.received.to_string()]);
            rows.push(vec!["Packet loss".to_string(), format_percentage(stats.packet_loss)]);
            rows.push(vec!["Min".to_string(), format_ms(stats.minping)]);
            rows.push(vec!["Avg".to_string(), format_ms(stats.avgping)]);
            rows.push(vec!["Max".to_string(), format_ms(stats.maxping)]);
            rows.push(vec!["Jitter".to_string(), format_ms(stats.jitter)]);
        }
        rows.push(vec!["Return code".to_string(), result.return_code.to_string()]);
        rows
    }

    pub(crate) fn hop_rows(result: &TracerouteResult) -> Vec<RowData> {
        result
            .hops
            .iter()
            .map(|hop| {
                vec![
                    hop.hop.to_string(),
                    join_distinct(&hop.name),
                    join_distinct(&hop.ip),
                    if hop.rtt.is_empty() { "*".to_string() } else { hop.rtt.join(" ") },
                ]
            })
            .collect()
    }

    pub(crate) fn speedtest_rows(result: &SpeedtestResult) -> Vec<RowData> {
        vec![
            vec!["Server".to_string(), result.server.clone()],
            vec!["Ping".to_string(), format!("{:.2} ms", result.ping)],
            vec!["Download".to_string(), result.download_readable.clone()],
            vec!["Upload".to_string(), result.upload_readable.clone()],
        ]
    }

    pub(crate) fn wakeonlan_rows(result: &WakeOnLanResult) -> Vec<RowData> {
        vec![
            vec!["MAC address".to_string(), result.mac_address.to_string()],
            vec![
                "IP address".to_string(),
                result.ip_address.clone().unwrap_or_else(|| crate::defaults::WOL_BROADCAST_ADDRESS.to_string()),
            ],
            vec![
                "Port".to_string(),
                result.port.unwrap_or(crate::defaults::WOL_DEFAULT_PORT).to_string(),
            ],
        ]
    }

    fn table(format: &TableFormat, rows: &[RowData]) -> String {
        format
            .layout(rows)
            .iter()
            .map(TableLine::text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub(crate) fn raw_output_section(&self, output: &str) -> Result<String> {
        let mut section = String::new();
        writeln!(section, "\nRaw output:")
            .map_err(|e| AppError::io(format!("Failed to format output: {}", e)))?;
        write!(section, "{}", output.trim_end())
            .map_err(|e| AppError::io(format!("Failed to format output: {}", e)))?;
        Ok(section)
    }
}

impl OutputFormatter for PlainFormatter {
    fn format_ping(&self, result: &PingResult) -> Result<String> {
        let mut output = format!("PING {}\n", result.host);
        output.push_str(&Self::table(&self.key_value_format(), &Self::ping_rows(result)));

        if result.stats.is_none() {
            output.push('\n');
            output.push_str(&self.format_warning("Unable to parse ping output")?);
        }
        if self.options.verbose_mode || result.stats.is_none() {
            output.push_str(&self.raw_output_section(&result.output)?);
        }
        Ok(output)
    }

    fn format_traceroute(&self, result: &TracerouteResult) -> Result<String> {
        let mut output = format!(
            "TRACEROUTE {} ({})\n",
            result.dest_host.as_deref().unwrap_or(&result.host),
            result.dest_ip.as_deref().unwrap_or("?")
        );
        output.push_str(&Self::table(&self.hop_format(), &Self::hop_rows(result)));

        if let Some(unique_id) = &result.unique_id {
            write!(output, "\nunique_id: {}", unique_id)
                .map_err(|e| AppError::io(format!("Failed to format traceroute: {}", e)))?;
        }
        if self.options.verbose_mode {
            output.push_str(&self.raw_output_section(&result.output)?);
        }
        Ok(output)
    }

    fn format_speedtest(&self, result: &SpeedtestResult) -> Result<String> {
        let mut output = String::from("SPEEDTEST\n");
        output.push_str(&Self::table(&self.key_value_format(), &Self::speedtest_rows(result)));
        Ok(output)
    }

    fn format_wakeonlan(&self, result: &WakeOnLanResult) -> Result<String> {
        let mut output = self.format_success(&result.message)?;
        output.push('\n');
        output.push_str(&Self::table(&self.key_value_format(), &Self::wakeonlan_rows(result)));
        Ok(output)
    }

    fn format_warning(&self, warning: &str) -> Result<String> {
        Ok(format!("WARNING: {}", warning))
    }

    fn format_success(&self, message: &str) -> Result<String> {
        Ok(format!("SUCCESS: {}", message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PingStats, TracerouteHop};

    fn formatter(verbose: bool) -> PlainFormatter {
        PlainFormatter::new(FormattingOptions {
            enable_color: false,
            verbose_mode: verbose,
            ..Default::default()
        })
    }

    fn ping_result(stats: Option<PingStats>) -> PingResult {
        PingResult {
            host: "example.com".to_string(),
            output: "raw ping text".to_string(),
            return_code: 0,
            stats,
        }
    }

    #[test]
    fn test_table_layout_aligns_columns() {
        let format = TableFormat {
            columns: vec![Column::right("Hop"), Column::left("Name")],
            show_borders: true,
            show_header: true,
            max_column_width: 10,
        };
        let lines = format.layout(&[
            vec!["1".to_string(), "gateway".to_string()],
            vec!["10".to_string(), "a-very-long-router-name".to_string()],
        ]);
        let text: Vec<&str> = lines.iter().map(TableLine::text).collect();

        assert_eq!(text[0], "+-----+------------+");
        assert_eq!(text[1], "| Hop | Name       |");
        assert_eq!(text[3], "|   1 | gateway    |");
        assert_eq!(text[4], "|  10 | a-very-lon |");
        assert!(matches!(lines[3], TableLine::Row(0, _)));
        assert_eq!(lines.len(), 6);
    }

    #[test]
    fn test_join_distinct() {
        let values = vec!["a".to_string(), "b".to_string(), "a".to_string()];
        assert_eq!(join_distinct(&values), "a, b");
        assert_eq!(join_distinct(&[]), "*");
    }

    #[test]
    fn test_ping_with_stats() {
        let stats = PingStats {
            host: "example.com".to_string(),
            sent: 3,
            received: 3,
            packet_loss: 0.0,
            minping: Some(1.0),
            avgping: Some(2.0),
            maxping: Some(3.0),
            jitter: None,
        };
        let text = formatter(false).format_ping(&ping_result(Some(stats))).unwrap();

        assert!(text.starts_with("PING example.com"));
        assert!(text.contains("| Packet loss | 0.0%"));
        assert!(text.contains("2.000 ms"));
        assert!(!text.contains("raw ping text"));
    }

    #[test]
    fn test_ping_without_stats_shows_raw_output() {
        let text = formatter(false).format_ping(&ping_result(None)).unwrap();
        assert!(text.contains("WARNING: Unable to parse ping output"));
        assert!(text.contains("raw ping text"));
    }

    #[test]
    fn test_traceroute_rows() {
        let result = TracerouteResult {
            host: "example.com".to_string(),
            output: String::new(),
            return_code: 0,
            hops: vec![
                TracerouteHop {
                    hop: 1,
                    rtt: vec!["0.4".to_string(), "0.5".to_string()],
                    ip: vec!["192.168.1.1".to_string(), "192.168.1.1".to_string()],
                    name: vec!["gateway".to_string(), "gateway".to_string()],
                    dest_ip: None,
                    dest_host: None,
                },
                TracerouteHop { hop: 2, rtt: vec![], ip: vec![], name: vec![], dest_ip: None, dest_host: None },
            ],
            dest_ip: Some("93.184.216.34".to_string()),
            dest_host: Some("example.com".to_string()),
            unique_id: Some("0a1b2c3d".to_string()),
        };

        let text = formatter(false).format_traceroute(&result).unwrap();
        assert!(text.starts_with("TRACEROUTE example.com (93.184.216.34)"));
        assert!(text.contains("| gateway | 192.168.1.1 |  0.4 0.5 |"));
        assert!(text.contains("|   2 | *       | *           |        * |"));
        assert!(text.ends_with("unique_id: 0a1b2c3d"));
    }
}
