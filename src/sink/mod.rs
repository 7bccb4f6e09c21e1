//! Event sinks for results bound for the indexer
//!
//! Every tool can hand its records to an [`EventSink`]. The only production
//! implementation is [`StashWriter`], which drops stash files into the
//! indexer's spool directory.

mod stash;

pub use stash::{StashWriter, EVENT_BREAKER};

use crate::error::Result;
use async_trait::async_trait;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;
use std::path::PathBuf;

/// Ordered collection of event fields
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StashEvent {
    fields: Vec<(String, Value)>,
}

impl StashEvent {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, replacing any earlier value under the same key
    pub fn push<T: Serialize>(&mut self, key: &str, value: T) {
        let value = serde_json::to_value(value).unwrap_or(Value::Null);
        if let Some(slot) = self.fields.iter_mut().find(|(k, _)| k == key) {
            slot.1 = value;
        } else {
            self.fields.push((key.to_string(), value));
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn fields(&self) -> &[(String, Value)] {
        &self.fields
    }
}

impl Serialize for StashEvent {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (key, value) in &self.fields {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Routing metadata attached to every written event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventMeta {
    pub index: String,
    pub source: String,
    pub sourcetype: String,
}

impl EventMeta {
    pub fn new<I, S, T>(index: I, source: S, sourcetype: T) -> Self
    where
        I: Into<String>,
        S: Into<String>,
        T: Into<String>,
    {
        Self {
            index: index.into(),
            source: source.into(),
            sourcetype: sourcetype.into(),
        }
    }
}

/// Destination for structured records
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Persist one event and return where it was written
    async fn write_event(&self, meta: &EventMeta, event: &StashEvent) -> Result<PathBuf>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_push_replaces_existing_key_in_place() {
        let mut event = StashEvent::new();
        event.push("hop", 1);
        event.push("ip", vec!["10.0.0.1"]);
        event.push("hop", 2);

        let keys: Vec<&str> = event.fields().iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["hop", "ip"]);
        assert_eq!(event.get("hop"), Some(&json!(2)));
    }

    #[test]
    fn test_serializes_as_ordered_object() {
        let mut event = StashEvent::new();
        event.push("zeta", "last-alphabetically");
        event.push("alpha", 1);

        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(json, r#"{"zeta":"last-alphabetically","alpha":1}"#);
    }
}
