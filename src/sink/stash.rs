//! Stash file writer
//!
//! A stash file is a small text file the indexer consumes from its spool
//! directory: one `***SPLUNK***` header naming the index, source and
//! sourcetype, then events separated by the breaker line.

use super::{EventMeta, EventSink, StashEvent};
use crate::error::{ErrorContext, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::path::PathBuf;
use uuid::Uuid;

/// Line separating events inside a stash file
pub const EVENT_BREAKER: &str = "==##~~##~~  1E8N3D4E6V5E7N2T9 ~~##~~##==";

/// Writes one stash file per event into a spool directory
#[derive(Debug, Clone)]
pub struct StashWriter {
    spool_dir: PathBuf,
}

impl StashWriter {
    pub fn new<P: Into<PathBuf>>(spool_dir: P) -> Self {
        Self {
            spool_dir: spool_dir.into(),
        }
    }

    /// Render the complete file contents for one event
    pub fn render(meta: &EventMeta, event: &StashEvent, timestamp: DateTime<Utc>) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "***SPLUNK*** index={} source=\"{}\" sourcetype=\"{}\"\n",
            meta.index,
            escape(&meta.source),
            escape(&meta.sourcetype)
        ));
        out.push_str(EVENT_BREAKER);
        out.push('\n');
        out.push_str(&format_event(event, timestamp));
        out.push('\n');
        out.push_str(EVENT_BREAKER);
        out.push('\n');
        out
    }
}

#[async_trait]
impl EventSink for StashWriter {
    async fn write_event(&self, meta: &EventMeta, event: &StashEvent) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.spool_dir)
            .await
            .with_context(|| format!("Failed to create spool directory {}", self.spool_dir.display()))?;

        let stem = Uuid::new_v4().simple().to_string();
        let partial = self.spool_dir.join(format!("{}.partial", stem));
        let target = self.spool_dir.join(format!("{}.{}", stem, crate::defaults::STASH_FILE_EXTENSION));

        let contents = Self::render(meta, event, Utc::now());

        // The indexer must never see a half-written file under the final name
        tokio::fs::write(&partial, contents)
            .await
            .with_context(|| format!("Failed to write stash file {}", partial.display()))?;
        tokio::fs::rename(&partial, &target)
            .await
            .with_context(|| format!("Failed to move stash file into place at {}", target.display()))?;

        Ok(target)
    }
}

/// Format the event line: a timestamp followed by `key="value"` pairs
fn format_event(event: &StashEvent, timestamp: DateTime<Utc>) -> String {
    let mut pairs = Vec::new();

    for (key, value) in event.fields() {
        match value {
            Value::Null => {}
            Value::Array(items) => {
                for item in items {
                    if let Some(text) = scalar_text(item) {
                        pairs.push(format!("{}=\"{}\"", key, escape(&text)));
                    }
                }
            }
            other => {
                if let Some(text) = scalar_text(other) {
                    pairs.push(format!("{}=\"{}\"", key, escape(&text)));
                }
            }
        }
    }

    format!("{} {}", timestamp.format("%Y-%m-%d %H:%M:%S%.3f %z"), pairs.join(", "))
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

fn escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}
