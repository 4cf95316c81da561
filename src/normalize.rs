use crate::record::{EventTime, LogEvent};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tracing::Level;

/// Severity as carried by a rich record: a `tracing` level or free text
/// from a source that only knows its level by name.
#[derive(Debug, Clone)]
pub enum RecordLevel {
    Named(Level),
    Text(String),
}

/// Timestamp as carried by a rich record before normalization.
#[derive(Debug, Clone)]
pub enum RecordTime {
    DateTime(DateTime<Utc>),
    Epoch(f64),
}

/// Fully structured record: leveled metadata plus an extras mapping.
#[derive(Debug, Clone, Default)]
pub struct RichRecord {
    pub time: Option<RecordTime>,
    pub level: Option<RecordLevel>,
    pub message: Option<String>,
    pub logger: Option<String>,
    pub function: Option<String>,
    pub line: Option<u32>,
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// Fallback record shape: only a level name, a message and best-effort
/// source location. No extras, no timestamp.
#[derive(Debug, Clone)]
pub struct PlainRecord {
    pub level_name: Option<String>,
    pub message: String,
    pub logger: Option<String>,
    pub function: Option<String>,
    pub line: Option<u32>,
}

/// Incoming record, one of the two shapes the pipeline accepts.
#[derive(Debug, Clone)]
pub enum SinkRecord {
    Rich(RichRecord),
    Plain(PlainRecord),
}

const DEFAULT_LEVEL: &str = "INFO";
const DEFAULT_LOGGER: &str = "unknown";
const DEFAULT_FUNCTION: &str = "<unknown>";

/// Convert an incoming record into the canonical [`LogEvent`].
///
/// Total over both variants: missing fields substitute their defaults
/// (level `INFO`, current wall-clock time, logger `unknown`, function
/// `<unknown>`, line `0`) instead of failing.
pub fn normalize(record: SinkRecord) -> LogEvent {
    match record {
        SinkRecord::Rich(rich) => {
            let time = match rich.time {
                Some(RecordTime::DateTime(dt)) => EventTime::Iso(dt.to_rfc3339()),
                Some(RecordTime::Epoch(epoch)) => EventTime::Epoch(epoch),
                None => EventTime::Iso(Utc::now().to_rfc3339()),
            };
            let level = match rich.level {
                Some(RecordLevel::Named(level)) => level.to_string(),
                Some(RecordLevel::Text(name)) => name,
                None => DEFAULT_LEVEL.to_string(),
            };
            LogEvent {
                time,
                message: rich.message.unwrap_or_default(),
                level,
                logger: rich.logger.unwrap_or_else(|| DEFAULT_LOGGER.to_string()),
                function: rich
                    .function
                    .unwrap_or_else(|| DEFAULT_FUNCTION.to_string()),
                line: rich.line.unwrap_or(0),
                extra: rich.extra,
            }
        }
        SinkRecord::Plain(plain) => LogEvent {
            time: EventTime::Iso(Utc::now().to_rfc3339()),
            message: plain.message,
            level: plain
                .level_name
                .unwrap_or_else(|| DEFAULT_LEVEL.to_string()),
            logger: plain.logger.unwrap_or_else(|| DEFAULT_LOGGER.to_string()),
            function: plain
                .function
                .unwrap_or_else(|| DEFAULT_FUNCTION.to_string()),
            line: plain.line.unwrap_or(0),
            extra: BTreeMap::new(),
        },
    }
}
