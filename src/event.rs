// src/event.rs - Structured log events reconstructed from raw lines

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Severity levels, ordered from least to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Level {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
}

impl Level {
    pub const ALL: [Level; 6] = [
        Level::Trace,
        Level::Debug,
        Level::Info,
        Level::Warn,
        Level::Error,
        Level::Fatal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Trace => "TRACE",
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
            Level::Fatal => "FATAL",
        }
    }

    /// Match a level name at the very start of `text` (exact, case-sensitive).
    /// Returns the level and the byte length of its name.
    pub fn match_prefix(text: &str) -> Option<(Level, usize)> {
        Level::ALL
            .iter()
            .find(|level| text.starts_with(level.as_str()))
            .map(|level| (*level, level.as_str().len()))
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Level::ALL
            .iter()
            .find(|level| level.as_str() == s)
            .copied()
            .ok_or_else(|| format!("Unknown level: {}", s))
    }
}

/// Which field absorbs continuation lines of a multi-line event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppendMode {
    #[default]
    None,
    Message,
    Exception,
}

/// One log event, possibly spanning several physical lines
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Event {
    /// Milliseconds since the Unix epoch
    pub timestamp: Option<i64>,
    pub level: Option<Level>,
    pub logger: Option<String>,
    pub thread_name: Option<String>,
    pub message: Option<String>,
    pub exception_rendering: Option<String>,
    /// Line on which the event started (1-based)
    pub line_number: usize,
    /// Every physical line of the event, verbatim, joined by '\n'
    pub raw: String,
    pub append_mode: AppendMode,
}

impl Event {
    pub fn new(line_number: usize, raw_line: &str) -> Self {
        Event {
            line_number,
            raw: raw_line.to_string(),
            ..Default::default()
        }
    }

    /// Merge a continuation line into the event.
    ///
    /// `raw_line` is kept verbatim in `raw`; `content` (the line without a
    /// trailing carriage return) goes to the field picked by the append mode.
    pub fn append_line(&mut self, raw_line: &str, content: &str) {
        self.raw.push('\n');
        self.raw.push_str(raw_line);

        match self.append_mode {
            AppendMode::None => {}
            // the start line's message counts as a line even when it was empty
            AppendMode::Message => {
                let text = self.message.get_or_insert_with(String::new);
                text.push('\n');
                text.push_str(content);
            }
            AppendMode::Exception => match &mut self.exception_rendering {
                Some(text) => {
                    text.push('\n');
                    text.push_str(content);
                }
                None => self.exception_rendering = Some(content.to_string()),
            },
        }
    }

    /// Number of physical lines the event spans
    pub fn line_count(&self) -> usize {
        self.raw.split('\n').count()
    }

    pub fn has_exception(&self) -> bool {
        self.exception_rendering.is_some()
    }

    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        self.timestamp.and_then(DateTime::from_timestamp_millis)
    }

    /// Timestamp as RFC 3339 with millisecond precision
    pub fn timestamp_rfc3339(&self) -> Option<String> {
        self.datetime()
            .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    /// Look up a field by name, rendered as text
    pub fn field(&self, name: &str) -> Option<String> {
        match name {
            "timestamp" => self.timestamp_rfc3339(),
            "level" => self.level.map(|l| l.to_string()),
            "logger" => self.logger.clone(),
            "thread" | "thread_name" => self.thread_name.clone(),
            "message" => self.message.clone(),
            "exception" | "exception_rendering" => self.exception_rendering.clone(),
            "line" | "line_number" => Some(self.line_number.to_string()),
            "raw" => Some(self.raw.clone()),
            _ => None,
        }
    }

    /// Field names in output order
    pub const FIELD_NAMES: [&'static str; 7] = [
        "timestamp",
        "level",
        "logger",
        "thread",
        "message",
        "exception",
        "line",
    ];

    pub fn to_record(&self) -> EventRecord {
        EventRecord {
            timestamp: self.datetime(),
            level: self.level,
            logger: self.logger.clone(),
            thread: self.thread_name.clone(),
            message: self.message.clone(),
            exception: self.exception_rendering.clone(),
            line: self.line_number,
        }
    }
}

/// An event as written to JSON lines, keyed like `Event::FIELD_NAMES`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<Level>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logger: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exception: Option<String>,
    pub line: usize,
}

/// Item handed out by `Parser::close`
#[derive(Debug, Clone, PartialEq)]
pub enum StreamItem {
    Event(Event),
    EndOfStream,
}

impl StreamItem {
    pub fn as_event(&self) -> Option<&Event> {
        match self {
            StreamItem::Event(event) => Some(event),
            StreamItem::EndOfStream => None,
        }
    }

    pub fn is_end(&self) -> bool {
        matches!(self, StreamItem::EndOfStream)
    }
}
