//! The four entry points: ping, traceroute, speedtest and wake-on-LAN
//!
//! Each invoker runs one external tool to completion, reshapes its output
//! into a record and, when an index is given, hands the record to the
//! event sink.

pub mod ping;
pub mod speedtest;
pub mod traceroute;
pub mod wakeonlan;

pub use ping::{ping, PingRequest};
pub use speedtest::{speedtest, SpeedtestRequest};
pub use traceroute::{traceroute, TracerouteRequest};
pub use wakeonlan::{wake_on_lan, WakeOnLanRequest};

use crate::{
    client::HostDirectory,
    error::{AppError, Result},
    executor::{CommandRunner, SystemCommandRunner},
    logging::Logger,
    models::Config,
    sink::{EventMeta, EventSink, StashEvent, StashWriter},
    types::Platform,
};
use std::path::PathBuf;
use std::sync::Arc;

/// Indexing options shared by every tool
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmitOptions {
    /// Events are only written when an index is given
    pub index: Option<String>,
    pub sourcetype: Option<String>,
    pub source: Option<String>,
}

impl EmitOptions {
    pub fn to_index<S: Into<String>>(index: S) -> Self {
        Self {
            index: Some(index.into()),
            ..Default::default()
        }
    }

    /// Routing metadata, or `None` when nothing should be written
    ///
    /// The index is written unquoted into the stash header, so only ASCII
    /// letters, digits, `_` and `-` are accepted.
    pub fn meta(&self, default_sourcetype: &str, default_source: &str) -> Result<Option<EventMeta>> {
        let Some(index) = self.index.as_deref().map(str::trim).filter(|i| !i.is_empty()) else {
            return Ok(None);
        };

        if !index.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
            return Err(AppError::validation(format!(
                "Invalid index name '{}': use only letters, digits, '_' and '-'",
                index
            )));
        }

        Ok(Some(EventMeta::new(
            index,
            self.source.as_deref().unwrap_or(default_source),
            self.sourcetype.as_deref().unwrap_or(default_sourcetype),
        )))
    }
}

/// Collaborators the tools run against
#[derive(Clone)]
pub struct ToolContext {
    pub runner: Arc<dyn CommandRunner>,
    pub sink: Arc<dyn EventSink>,
    pub hosts: Option<Arc<dyn HostDirectory>>,
    pub config: Config,
    pub logger: Logger,
    pub platform: Platform,
}

impl ToolContext {
    /// Real subprocesses and stash files in the configured spool directory
    pub fn new(config: Config, logger: Logger) -> Self {
        Self {
            runner: Arc::new(SystemCommandRunner::new()),
            sink: Arc::new(StashWriter::new(config.spool_dir.clone())),
            hosts: None,
            config,
            logger,
            platform: Platform::current(),
        }
    }

    pub fn with_runner(mut self, runner: Arc<dyn CommandRunner>) -> Self {
        self.runner = runner;
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_hosts(mut self, hosts: Arc<dyn HostDirectory>) -> Self {
        self.hosts = Some(hosts);
        self
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    /// Write one event and log where it went
    pub(crate) async fn emit(&self, meta: &EventMeta, event: &StashEvent) -> Result<PathBuf> {
        let path = self.sink.write_event(meta, event).await?;
        self.logger
            .info(&format!("Wrote stash file={}", path.display()))
            .field("index", &meta.index)
            .field("sourcetype", &meta.sourcetype)
            .log()
            .await;
        Ok(path)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Canned collaborators for driving the tools without a network

    use super::*;
    use crate::{
        executor::{CommandOutput, CommandSpec},
        models::HostRecord,
    };
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Returns fixed output and records every command it was asked to run
    pub struct StubRunner {
        output: String,
        return_code: i32,
        pub calls: Mutex<Vec<CommandSpec>>,
    }

    impl StubRunner {
        pub fn new(output: &str, return_code: i32) -> Self {
            Self {
                output: output.to_string(),
                return_code,
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl CommandRunner for StubRunner {
        async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput> {
            self.calls.lock().unwrap().push(spec.clone());
            Ok(CommandOutput {
                output: self.output.clone(),
                return_code: self.return_code,
                duration: Duration::from_millis(5),
            })
        }
    }

    /// Fails every command as if the binary were missing
    pub struct MissingBinaryRunner;

    #[async_trait]
    impl CommandRunner for MissingBinaryRunner {
        async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput> {
            Err(AppError::command_execution(format!("Failed to run '{}': not found", spec.program)))
        }
    }

    /// Keeps written events in memory
    #[derive(Default)]
    pub struct RecordingSink {
        pub events: Mutex<Vec<(EventMeta, StashEvent)>>,
    }

    #[async_trait]
    impl EventSink for RecordingSink {
        async fn write_event(&self, meta: &EventMeta, event: &StashEvent) -> Result<PathBuf> {
            let mut events = self.events.lock().unwrap();
            events.push((meta.clone(), event.clone()));
            Ok(PathBuf::from(format!("/spool/{}.stash_output", events.len())))
        }
    }

    /// In-memory host table
    #[derive(Default)]
    pub struct StaticHosts {
        pub records: HashMap<String, HostRecord>,
    }

    impl StaticHosts {
        pub fn with(mut self, record: HostRecord) -> Self {
            self.records.insert(record.name.clone(), record);
            self
        }
    }

    #[async_trait]
    impl HostDirectory for StaticHosts {
        async fn find_host(&self, name: &str) -> Result<Option<HostRecord>> {
            Ok(self.records.get(name).cloned())
        }
    }

    pub fn context(runner: Arc<dyn CommandRunner>, sink: Arc<RecordingSink>) -> ToolContext {
        ToolContext::new(Config::default(), Logger::new("TEST"))
            .with_runner(runner)
            .with_sink(sink)
            .with_platform(Platform::Linux)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meta_requires_index() {
        assert!(EmitOptions::default().meta("ping", "ping_search_command").unwrap().is_none());
        assert!(EmitOptions::to_index("  ").meta("ping", "ping_search_command").unwrap().is_none());
    }

    #[test]
    fn test_meta_defaults_and_overrides() {
        let meta = EmitOptions::to_index("main").meta("ping", "ping_search_command").unwrap().unwrap();
        assert_eq!(meta, EventMeta::new("main", "ping_search_command", "ping"));

        let options = EmitOptions {
            index: Some("net".to_string()),
            sourcetype: Some("custom".to_string()),
            source: Some("cli".to_string()),
        };
        assert_eq!(
            options.meta("ping", "ping_search_command").unwrap().unwrap(),
            EventMeta::new("net", "cli", "custom")
        );
    }

    #[test]
    fn test_meta_rejects_index_that_would_break_the_header() {
        for index in ["main net", "main\nsourcetype=x", "main\"", "net/ops"] {
            let err = EmitOptions::to_index(index).meta("ping", "ping_search_command").unwrap_err();
            assert_eq!(err.category(), "VALIDATION", "{}", index);
        }
        assert!(EmitOptions::to_index("net_ops-2").meta("ping", "ping_search_command").unwrap().is_some());
    }
}
