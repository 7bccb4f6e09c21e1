//! Topic help: configuration, stash output and usage examples
//!
//! clap renders the option reference (`--help`); the topics here cover
//! what does not fit on an option line.

use crate::{config::env::EnvManager, types::Platform};
use colored::*;

pub struct HelpSystem {
    platform: &'static str,
}

impl HelpSystem {
    pub fn new() -> Self {
        Self {
            platform: Platform::current().name(),
        }
    }

    /// Overview shown when no known topic was requested
    pub fn display_main_help(&self, use_colors: bool) -> String {
        let mut help = self.format_header(use_colors);
        help.push('\n');
        help.push_str(&self.format_usage_section(use_colors));
        help.push('\n');
        help.push_str(&self.format_examples_section(use_colors));
        help
    }

    pub fn display_topic_help(&self, topic: &str, use_colors: bool) -> Option<String> {
        match topic.to_lowercase().as_str() {
            "config" | "configuration" | "env" | "environment" => Some(self.format_configuration_help(use_colors)),
            "stash" | "output" | "index" => Some(self.format_stash_help(use_colors)),
            "examples" => Some(self.format_examples_section(use_colors)),
            _ => None,
        }
    }

    fn heading(&self, text: &str, use_colors: bool) -> String {
        if use_colors {
            text.bright_green().bold().to_string()
        } else {
            text.to_string()
        }
    }

    fn format_header(&self, use_colors: bool) -> String {
        let title = "Network Tools";
        let subtitle = "ping, traceroute, speedtest and wake-on-LAN with stash event output";
        let version = crate::VERSION;

        if use_colors {
            format!(
                "{}\n{}\nVersion: {} | Platform: {}\n",
                title.bright_cyan().bold(),
                subtitle.bright_blue(),
                version.green(),
                self.platform.yellow()
            )
        } else {
            format!("{}\n{}\nVersion: {} | Platform: {}\n", title, subtitle, version, self.platform)
        }
    }

    fn format_usage_section(&self, use_colors: bool) -> String {
        let patterns = [
            "nettools [OPTIONS] ping <HOST> [-c COUNT] [--index INDEX]",
            "nettools [OPTIONS] traceroute <HOST> [--unique-id ID] [--no-dest-info]",
            "nettools [OPTIONS] speedtest [--server HOST[:PORT]] [--runs N]",
            "nettools [OPTIONS] wakeonlan [HOST] [--mac MAC] [--ip IP] [--port PORT]",
            "nettools --help-topic <config|stash|examples>",
        ];

        let mut usage = format!("{}\n", self.heading("USAGE:", use_colors));
        for pattern in patterns {
            if use_colors {
                usage.push_str(&format!("  {}\n", pattern.bright_white()));
            } else {
                usage.push_str(&format!("  {}\n", pattern));
            }
        }
        usage
    }

    fn format_examples_section(&self, use_colors: bool) -> String {
        let examples = [
            ExampleHelp {
                title: "Ping a host three times",
                command: "nettools ping example.com -c 3",
                description: "Prints packet loss and round-trip statistics",
            },
            ExampleHelp {
                title: "Index a traceroute",
                command: "nettools traceroute example.com --index network",
                description: "Writes one stash event per hop, all sharing a unique_id",
            },
            ExampleHelp {
                title: "Bandwidth test as JSON",
                command: "nettools --format json speedtest --runs 1",
                description: "Picks the closest server when --server is omitted",
            },
            ExampleHelp {
                title: "Wake a host known to the KV store",
                command: "nettools --session-key $KEY wakeonlan nas",
                description: "MAC, IP and port come from the hosts collection unless given explicitly",
            },
        ];

        let mut section = format!("{}\n", self.heading("EXAMPLES:", use_colors));
        for example in &examples {
            section.push_str(&example.format(use_colors));
        }
        section
    }

    fn format_configuration_help(&self, use_colors: bool) -> String {
        let mut help = format!("{}\n\n", self.heading("CONFIGURATION REFERENCE", use_colors));
        help.push_str("Settings are read from a .env file, then the environment, then the\n");
        help.push_str("command line; later sources win.\n\n");
        help.push_str(&EnvManager::display_env_help());
        help.push_str("\nExample .env file:\n\n");
        help.push_str(&EnvManager::create_example_env_content());
        help
    }

    fn format_stash_help(&self, use_colors: bool) -> String {
        let mut help = format!("{}\n\n", self.heading("STASH OUTPUT", use_colors));
        help.push_str("With --index, results are written as stash files into the spool\n");
        help.push_str("directory ($SPLUNK_HOME/var/spool/splunk unless --spool-dir is given).\n");
        help.push_str("Each file holds a ***SPLUNK*** header and one event between breaker lines.\n\n");
        help.push_str("Default sourcetype / source per command:\n");
        for (command, sourcetype, source) in [
            ("ping", "ping", "ping_search_command"),
            ("traceroute", "traceroute", "traceroute_search_command"),
            ("speedtest", "speedtest", "speedtest_search_command"),
            ("wakeonlan", "wakeonlan", "wakeonlan_search_command"),
        ] {
            help.push_str(&format!("  {:<11} {:<11} {}\n", command, sourcetype, source));
        }
        help
    }
}

impl Default for HelpSystem {
    fn default() -> Self {
        Self::new()
    }
}

struct ExampleHelp {
    title: &'static str,
    command: &'static str,
    description: &'static str,
}

impl ExampleHelp {
    fn format(&self, use_colors: bool) -> String {
        if use_colors {
            format!(
                "  {}:\n    {}\n    {}\n",
                self.title.bright_yellow().bold(),
                self.command.bright_white(),
                self.description.bright_blue().italic()
            )
        } else {
            format!("  {}:\n    {}\n    {}\n", self.title, self.command, self.description)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_main_help_display() {
        let help = HelpSystem::new().display_main_help(false);
        assert!(help.contains("Network Tools"));
        assert!(help.contains("USAGE:"));
        assert!(help.contains("nettools [OPTIONS] wakeonlan"));
        assert!(help.contains("EXAMPLES:"));
    }

    #[test]
    fn test_topic_help() {
        let help_system = HelpSystem::new();
        assert!(help_system.display_topic_help("config", false).unwrap().contains("SPLUNK_SESSION_KEY"));
        assert!(help_system.display_topic_help("STASH", false).unwrap().contains("traceroute_search_command"));
        assert!(help_system.display_topic_help("examples", false).is_some());
        assert!(help_system.display_topic_help("dns", false).is_none());
    }
}
