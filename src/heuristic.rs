// src/heuristic.rs - Fallback matcher for JBoss-style lines when no layout is given

use crate::event::{AppendMode, Event, Level};
use crate::pattern::date::DateFormat;
use crate::pattern::Mismatch;
use crate::scanner::scan_balanced;
use once_cell::sync::Lazy;

/// Timestamp formats tried at the start of a line, in order
static TIMESTAMP_FORMATS: Lazy<Vec<DateFormat>> = Lazy::new(|| {
    ["HH:mm:ss,SSS", "MM/dd/yy HH:mm:ss,SSS"]
        .iter()
        .filter_map(|format| DateFormat::resolve(format).ok())
        .collect()
});

/// Fields recognized on the first line of an event
#[derive(Debug, Clone, PartialEq)]
pub struct HeuristicMatch {
    pub timestamp: Option<i64>,
    pub level: Level,
    pub logger: String,
    pub thread_name: String,
    pub message: Option<String>,
}

impl HeuristicMatch {
    pub fn into_event(self, line_number: usize, raw_line: &str) -> Event {
        let mut event = Event::new(line_number, raw_line);
        event.timestamp = self.timestamp;
        event.level = Some(self.level);
        event.logger = Some(self.logger);
        event.thread_name = Some(self.thread_name);
        event.message = self.message;
        event.append_mode = AppendMode::Message;
        event
    }
}

/// Recognizes `[timestamp] LEVEL [category] (thread) message` lines
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicMatcher;

impl HeuristicMatcher {
    pub fn new() -> Self {
        HeuristicMatcher
    }

    /// `Ok(None)` when the line is not the first line of an event. Without a
    /// timestamp only a complete `LEVEL [category] (thread)` prefix counts;
    /// after a timestamp a missing part is an error.
    pub fn match_line(&self, content: &str) -> Result<Option<HeuristicMatch>, Mismatch> {
        let mut pos = skip_noise(content);

        let timestamp = match parse_timestamp(&content[pos..]) {
            Some((millis, len)) => {
                pos += len;
                pos += leading_whitespace(&content[pos..]);
                Some(millis)
            }
            None => None,
        };

        match (match_header(content, pos, timestamp), timestamp) {
            (Ok(found), _) => Ok(Some(found)),
            (Err(_), None) => Ok(None),
            (Err(e), Some(_)) => Err(e),
        }
    }
}

/// Level, category, thread and message starting at `pos`
fn match_header(content: &str, mut pos: usize, timestamp: Option<i64>) -> Result<HeuristicMatch, Mismatch> {
    pos += leading_spaces(&content[pos..]);
    let (level, len) = match_level(&content[pos..]).ok_or_else(|| {
        let expecting = if timestamp.is_some() {
            "expecting a level after the timestamp"
        } else {
            "expecting a level"
        };
        mismatch(pos, expecting)
    })?;
    pos += len;

    pos += leading_spaces(&content[pos..]);
    let (logger, next) = enclosed_at(content, pos, '[', ']')?;
    pos = next;

    pos += leading_spaces(&content[pos..]);
    let (thread_name, next) = enclosed_at(content, pos, '(', ')')?;
    pos = next;

    pos += leading_spaces(&content[pos..]);
    let message = &content[pos..];

    Ok(HeuristicMatch {
        timestamp,
        level,
        logger,
        thread_name,
        message: if message.is_empty() {
            None
        } else {
            Some(message.to_string())
        },
    })
}

fn mismatch(offset: usize, message: impl Into<String>) -> Mismatch {
    Mismatch {
        offset,
        message: message.into(),
    }
}

fn parse_timestamp(text: &str) -> Option<(i64, usize)> {
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| format.parse_prefix(text))
}

/// Level name followed by whitespace or the end of the line
fn match_level(text: &str) -> Option<(Level, usize)> {
    let (level, len) = Level::match_prefix(text)?;
    match text[len..].chars().next() {
        None => Some((level, len)),
        Some(c) if c.is_whitespace() => Some((level, len)),
        Some(_) => None,
    }
}

/// The `left ... right` group that must start exactly at `pos`
fn enclosed_at(content: &str, pos: usize, left: char, right: char) -> Result<(String, usize), Mismatch> {
    let expecting = || mismatch(pos, format!("expecting '{}...{}'", left, right));

    if !content[pos..].starts_with(left) {
        return Err(expecting());
    }
    match scan_balanced(content, pos, left, right) {
        Ok(Some(enclosed)) => Ok((enclosed.content.to_string(), enclosed.next)),
        Ok(None) => Err(expecting()),
        Err(unbalanced) => Err(mismatch(unbalanced.open, unbalanced.to_string())),
    }
}

/// Byte length of leading control characters and ANSI SGR sequences
fn skip_noise(content: &str) -> usize {
    let bytes = content.as_bytes();
    let mut pos = 0;

    while pos < bytes.len() {
        if bytes[pos] == 0x1b && bytes.get(pos + 1) == Some(&b'[') {
            let params = bytes[pos + 2..]
                .iter()
                .take_while(|b| b.is_ascii_digit() || **b == b';')
                .count();
            if bytes.get(pos + 2 + params) == Some(&b'm') {
                pos += params + 3;
                continue;
            }
        }
        if bytes[pos].is_ascii_control() {
            pos += 1;
            continue;
        }
        break;
    }
    pos
}

fn leading_spaces(text: &str) -> usize {
    text.len() - text.trim_start_matches(' ').len()
}

fn leading_whitespace(text: &str) -> usize {
    text.len() - text.trim_start().len()
}
