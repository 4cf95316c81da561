use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::BTreeMap;

/// Event timestamp as shipped on the wire: ISO-8601 text or a raw epoch
/// number. Both serialize as a JSON scalar.
#[derive(Debug, Clone, PartialEq)]
pub enum EventTime {
    Iso(String),
    Epoch(f64),
}

/// Canonical log event, one per line in the NDJSON ingest body.
///
/// Reserved fields (`_time`, `message`, `level`, `logger`, `function`,
/// `line`) and the flattened `extra` map share one JSON object. On a key
/// collision the extra value wins and the reserved field is not emitted,
/// so every key appears at most once.
#[derive(Debug, Clone)]
pub struct LogEvent {
    pub time: EventTime,
    pub message: String,
    pub level: String,
    pub logger: String,
    pub function: String,
    pub line: u32,
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Serialize for LogEvent {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(None)?;
        if !self.extra.contains_key("_time") {
            match &self.time {
                EventTime::Iso(s) => map.serialize_entry("_time", s)?,
                EventTime::Epoch(e) => map.serialize_entry("_time", e)?,
            }
        }
        if !self.extra.contains_key("message") {
            map.serialize_entry("message", &self.message)?;
        }
        if !self.extra.contains_key("level") {
            map.serialize_entry("level", &self.level)?;
        }
        if !self.extra.contains_key("logger") {
            map.serialize_entry("logger", &self.logger)?;
        }
        if !self.extra.contains_key("function") {
            map.serialize_entry("function", &self.function)?;
        }
        if !self.extra.contains_key("line") {
            map.serialize_entry("line", &self.line)?;
        }
        for (key, value) in &self.extra {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}
