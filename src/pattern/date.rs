// src/pattern/date.rs - Date sub-patterns of %d{...}

use crate::error::CompileError;
use chrono::format::{Item, Parsed, StrftimeItems};
use chrono::{DateTime, Utc};

/// Named date formats accepted inside `%d{...}`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatePreset {
    Default,
    Iso8601,
    Iso8601Basic,
    Absolute,
    Date,
    Compact,
    Unix,
    UnixMillis,
}

impl DatePreset {
    pub const ALL: [DatePreset; 8] = [
        DatePreset::Default,
        DatePreset::Iso8601,
        DatePreset::Iso8601Basic,
        DatePreset::Absolute,
        DatePreset::Date,
        DatePreset::Compact,
        DatePreset::Unix,
        DatePreset::UnixMillis,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            DatePreset::Default => "DEFAULT",
            DatePreset::Iso8601 => "ISO8601",
            DatePreset::Iso8601Basic => "ISO8601_BASIC",
            DatePreset::Absolute => "ABSOLUTE",
            DatePreset::Date => "DATE",
            DatePreset::Compact => "COMPACT",
            DatePreset::Unix => "UNIX",
            DatePreset::UnixMillis => "UNIX_MILLIS",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        DatePreset::ALL.iter().copied().find(|p| p.name() == name)
    }

    /// Equivalent literal date format, if the preset has one
    pub fn pattern(&self) -> Option<&'static str> {
        match self {
            DatePreset::Default => Some("yyyy-MM-dd HH:mm:ss,SSS"),
            DatePreset::Iso8601 => Some("yyyy-MM-dd'T'HH:mm:ss,SSS"),
            DatePreset::Iso8601Basic => Some("yyyyMMdd'T'HHmmss,SSS"),
            DatePreset::Absolute => Some("HH:mm:ss,SSS"),
            DatePreset::Date => Some("dd MMM yyyy HH:mm:ss,SSS"),
            DatePreset::Compact => Some("yyyyMMddHHmmssSSS"),
            DatePreset::Unix | DatePreset::UnixMillis => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum DateToken {
    Literal(String),
    Year(usize),
    MonthNumber,
    MonthName,
    Day,
    Weekday,
    Hour24,
    Hour12,
    AmPm,
    Minute,
    Second,
    Millis,
    Offset,
}

impl DateToken {
    fn width(&self) -> usize {
        match self {
            DateToken::Literal(text) => text.chars().count(),
            DateToken::Year(width) => *width,
            DateToken::MonthName | DateToken::Weekday => 3,
            DateToken::Millis => 3,
            DateToken::AmPm => 2,
            DateToken::Offset => 5,
            _ => 2,
        }
    }

    /// chrono strftime spelling of this token
    fn push_strftime(&self, out: &mut String) {
        let spec = match self {
            DateToken::Literal(text) => {
                out.push_str(&text.replace('%', "%%"));
                return;
            }
            DateToken::Year(2) => "%y",
            DateToken::Year(_) => "%Y",
            DateToken::MonthNumber => "%m",
            DateToken::MonthName => "%b",
            DateToken::Day => "%d",
            DateToken::Weekday => "%a",
            DateToken::Hour24 => "%H",
            DateToken::Hour12 => "%I",
            DateToken::AmPm => "%p",
            DateToken::Minute => "%M",
            DateToken::Second => "%S",
            DateToken::Millis => "%3f",
            DateToken::Offset => "%z",
        };
        out.push_str(spec);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum DateKind {
    Fields { width: usize, items: Vec<Item<'static>> },
    UnixSeconds,
    UnixMillis,
}

/// A compiled date format: parses and renders timestamps in epoch millis (UTC)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateFormat {
    source: String,
    preset: Option<DatePreset>,
    kind: DateKind,
}

impl Default for DateFormat {
    fn default() -> Self {
        DateFormat::from_preset(DatePreset::Default)
    }
}

impl DateFormat {
    pub fn from_preset(preset: DatePreset) -> Self {
        let kind = match preset.pattern() {
            // preset patterns are known to be valid
            Some(pattern) => compile_fields(pattern).unwrap_or(DateKind::UnixMillis),
            None if preset == DatePreset::Unix => DateKind::UnixSeconds,
            None => DateKind::UnixMillis,
        };
        DateFormat {
            source: preset.name().to_string(),
            preset: Some(preset),
            kind,
        }
    }

    /// Resolve the body of `%d{...}`: a preset name or a literal date format
    pub fn resolve(body: &str) -> Result<Self, CompileError> {
        if let Some(preset) = DatePreset::from_name(body) {
            return Ok(DateFormat::from_preset(preset));
        }
        let kind = compile_fields(body).map_err(|reason| CompileError::InvalidDateFormat {
            format: body.to_string(),
            reason,
        })?;
        Ok(DateFormat {
            source: body.to_string(),
            preset: None,
            kind,
        })
    }

    /// The text this format was resolved from
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn preset(&self) -> Option<DatePreset> {
        self.preset
    }

    /// Width in characters of every rendered date, or `None` for epoch
    /// formats which render a variable number of digits.
    pub fn expected_len(&self) -> Option<usize> {
        match &self.kind {
            DateKind::Fields { width, .. } => Some(*width),
            DateKind::UnixSeconds | DateKind::UnixMillis => None,
        }
    }

    /// Parse a complete date string into epoch millis
    pub fn parse(&self, text: &str) -> Result<i64, String> {
        match &self.kind {
            DateKind::UnixSeconds => parse_epoch(text)?
                .checked_mul(1000)
                .ok_or_else(|| format!("'{}' is out of range for epoch seconds", text)),
            DateKind::UnixMillis => parse_epoch(text),
            DateKind::Fields { width, items } => {
                let actual = text.chars().count();
                if actual != *width {
                    return Err(format!(
                        "'{}' has {} characters, date format '{}' expects {}",
                        text, actual, self.source, width
                    ));
                }
                parse_fields(items, text)
                    .map_err(|reason| format!("'{}' does not match '{}': {}", text, self.source, reason))
            }
        }
    }

    /// Parse a date at the start of `text`. Returns epoch millis and the byte
    /// length of the date.
    pub fn parse_prefix(&self, text: &str) -> Option<(i64, usize)> {
        let len = match self.expected_len() {
            Some(width) => byte_len_of_chars(text, width)?,
            None => text.bytes().take_while(u8::is_ascii_digit).count(),
        };
        if len == 0 {
            return None;
        }
        self.parse(&text[..len]).ok().map(|millis| (millis, len))
    }

    /// Render epoch millis (UTC) with this format
    pub fn format(&self, millis: i64) -> String {
        match &self.kind {
            DateKind::UnixSeconds => millis.div_euclid(1000).to_string(),
            DateKind::UnixMillis => millis.to_string(),
            DateKind::Fields { items, .. } => DateTime::<Utc>::from_timestamp_millis(millis)
                .unwrap_or_default()
                .format_with_items(items.iter())
                .to_string(),
        }
    }
}

/// Byte length of the first `chars` characters of `text`
pub(crate) fn byte_len_of_chars(text: &str, chars: usize) -> Option<usize> {
    if chars == 0 {
        return Some(0);
    }
    let mut iter = text.char_indices();
    let (last_start, last_char) = iter.nth(chars - 1)?;
    Some(last_start + last_char.len_utf8())
}

fn parse_epoch(text: &str) -> Result<i64, String> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!("'{}' is not an epoch number", text));
    }
    text.parse::<i64>()
        .map_err(|e| format!("'{}' is not an epoch number: {}", text, e))
}

fn compile_fields(pattern: &str) -> Result<DateKind, String> {
    let tokens = tokenize(pattern)?;
    if tokens.is_empty() {
        return Err("empty date format".to_string());
    }

    let has = |wanted: fn(&DateToken) -> bool| tokens.iter().any(wanted);
    if has(|t| *t == DateToken::Weekday)
        && !(has(|t| matches!(t, DateToken::Year(_)))
            && has(|t| matches!(t, DateToken::MonthNumber | DateToken::MonthName))
            && has(|t| *t == DateToken::Day))
    {
        return Err("a weekday needs year, month and day".to_string());
    }

    let mut strftime = String::new();
    for token in &tokens {
        token.push_strftime(&mut strftime);
    }
    let items = StrftimeItems::new(&strftime)
        .parse_to_owned()
        .map_err(|e| e.to_string())?
        .into_iter()
        // spaces are literal text in a date format, not "any whitespace"
        .map(|item| match item {
            Item::OwnedSpace(space) => Item::OwnedLiteral(space),
            other => other,
        })
        .collect();

    Ok(DateKind::Fields {
        width: tokens.iter().map(DateToken::width).sum(),
        items,
    })
}

fn tokenize(pattern: &str) -> Result<Vec<DateToken>, String> {
    let mut tokens = Vec::new();
    let mut literal = String::new();
    let mut chars = pattern.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '\'' {
            // '' is an escaped quote, otherwise read up to the closing quote
            if chars.peek() == Some(&'\'') {
                chars.next();
                literal.push('\'');
                continue;
            }
            let mut closed = false;
            while let Some(inner) = chars.next() {
                if inner == '\'' {
                    if chars.peek() == Some(&'\'') {
                        chars.next();
                        literal.push('\'');
                        continue;
                    }
                    closed = true;
                    break;
                }
                literal.push(inner);
            }
            if !closed {
                return Err("unterminated quote".to_string());
            }
            continue;
        }

        if !ch.is_ascii_alphabetic() {
            literal.push(ch);
            continue;
        }

        let mut count = 1;
        while chars.peek() == Some(&ch) {
            chars.next();
            count += 1;
        }

        let token = match ch {
            'y' if count == 2 => DateToken::Year(2),
            'y' if count <= 4 => DateToken::Year(4),
            'M' if count <= 2 => DateToken::MonthNumber,
            'M' if count == 3 => DateToken::MonthName,
            'd' if count <= 2 => DateToken::Day,
            'E' if count <= 3 => DateToken::Weekday,
            'H' if count <= 2 => DateToken::Hour24,
            'h' if count <= 2 => DateToken::Hour12,
            'a' if count == 1 => DateToken::AmPm,
            'm' if count <= 2 => DateToken::Minute,
            's' if count <= 2 => DateToken::Second,
            'S' if count <= 3 => DateToken::Millis,
            'Z' if count == 1 => DateToken::Offset,
            'M' | 'E' => return Err(format!("variable width field '{}'", ch.to_string().repeat(count))),
            other => {
                return Err(format!(
                    "unsupported pattern letter '{}'",
                    other.to_string().repeat(count)
                ))
            }
        };

        if !literal.is_empty() {
            tokens.push(DateToken::Literal(std::mem::take(&mut literal)));
        }
        tokens.push(token);
    }

    if !literal.is_empty() {
        tokens.push(DateToken::Literal(literal));
    }
    Ok(tokens)
}

fn parse_fields(items: &[Item<'static>], text: &str) -> Result<i64, String> {
    let mut parsed = Parsed::new();
    chrono::format::parse(&mut parsed, text, items.iter()).map_err(|e| e.to_string())?;
    fill_missing(&mut parsed).map_err(|e| e.to_string())?;

    let local = parsed
        .to_naive_datetime_with_offset(0)
        .map_err(|e| e.to_string())?;
    let offset_secs = i64::from(parsed.offset().unwrap_or(0));
    Ok(local.and_utc().timestamp_millis() - offset_secs * 1000)
}

/// Fields absent from the format default to 1970-01-01 00:00, AM
fn fill_missing(parsed: &mut Parsed) -> chrono::format::ParseResult<()> {
    if parsed.year().is_none() && parsed.year_mod_100().is_none() {
        parsed.set_year(1970)?;
    }
    if parsed.month().is_none() {
        parsed.set_month(1)?;
    }
    if parsed.day().is_none() {
        parsed.set_day(1)?;
    }
    match (parsed.hour_div_12(), parsed.hour_mod_12()) {
        (None, None) => parsed.set_hour(0)?,
        (None, Some(_)) => parsed.set_ampm(false)?,
        (Some(_), None) => parsed.set_hour12(12)?,
        (Some(_), Some(_)) => {}
    }
    if parsed.minute().is_none() {
        parsed.set_minute(0)?;
    }
    Ok(())
}
