// src/pattern/component.rs - One token of a compiled conversion pattern

use crate::error::CompileError;
use crate::event::{Event, Level};
use crate::pattern::date::{byte_len_of_chars, DateFormat};
use crate::pattern::modifier::FormatModifier;
use crate::scanner::{closing_marker, scan_balanced};
use once_cell::sync::Lazy;
use regex::Regex;

/// `": " <qualified.ClassName> ": "` somewhere in a line
static THROWABLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r": (?:[A-Za-z_$][\w$]*\.)+[A-Z][\w$]*: ").unwrap());

/// Typed value carved out of a line by one component
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Timestamp(i64),
    Level(Level),
    Text(String),
}

/// Value of a component plus the half-open byte range it consumed
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedSpan {
    pub value: Option<FieldValue>,
    pub from: usize,
    pub to: usize,
}

impl ParsedSpan {
    pub fn is_empty(&self) -> bool {
        self.from == self.to
    }
}

/// A component failed to match; `offset` is a byte offset in the line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatch {
    pub offset: usize,
    pub message: String,
}

impl Mismatch {
    fn new(offset: usize, message: impl Into<String>) -> Self {
        Mismatch {
            offset,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ComponentKind {
    /// Literal text; holds the text to match, not the pattern source
    Literal(String),
    Date(DateFormat),
    Level,
    Logger { precision: Option<usize> },
    Thread,
    LineSeparator,
    Message,
    Exception,
    /// A conversion this crate does not interpret (e.g. `%X{key}`, `%L`)
    Unknown {
        conversion: char,
        option: Option<String>,
    },
}

/// One compiled token of a pattern layout
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    kind: ComponentKind,
    identifier: Option<char>,
    modifier: Option<FormatModifier>,
    literal: String,
}

impl Component {
    pub fn literal_text(text: &str) -> Self {
        Component {
            kind: ComponentKind::Literal(text.to_string()),
            identifier: None,
            modifier: None,
            literal: text.to_string(),
        }
    }

    /// `%%`, matching a single percent sign
    pub fn escaped_percent() -> Self {
        Component {
            kind: ComponentKind::Literal("%".to_string()),
            identifier: None,
            modifier: None,
            literal: "%%".to_string(),
        }
    }

    pub fn kind(&self) -> &ComponentKind {
        &self.kind
    }

    /// Conversion character, `None` for literal text
    pub fn identifier(&self) -> Option<char> {
        self.identifier
    }

    pub fn modifier(&self) -> Option<&FormatModifier> {
        self.modifier.as_ref()
    }

    /// The exact slice of the pattern this component was built from
    pub fn literal(&self) -> &str {
        &self.literal
    }

    pub fn is_literal(&self) -> bool {
        matches!(self.kind, ComponentKind::Literal(_))
    }

    fn describe(&self) -> String {
        match &self.kind {
            ComponentKind::Literal(text) => format!("literal '{}'", text),
            ComponentKind::Date(_) => "date".to_string(),
            ComponentKind::Level => "level".to_string(),
            ComponentKind::Logger { .. } => "logger".to_string(),
            ComponentKind::Thread => "thread name".to_string(),
            ComponentKind::LineSeparator => "line separator".to_string(),
            ComponentKind::Message => "message".to_string(),
            ComponentKind::Exception => "exception".to_string(),
            ComponentKind::Unknown { conversion, .. } => format!("'%{}'", conversion),
        }
    }

    fn unpad<'a>(&self, field: &'a str) -> &'a str {
        match &self.modifier {
            Some(modifier) => modifier.unapply(field),
            None => field,
        }
    }

    /// Carve this component's span out of `content` starting at `from` and
    /// convert it. `rest` holds the components that follow in the layout.
    pub fn extract(
        &self,
        content: &str,
        from: usize,
        rest: &[Component],
    ) -> Result<ParsedSpan, Mismatch> {
        let span = |to: usize, value: Option<FieldValue>| ParsedSpan { value, from, to };
        let remaining = &content[from..];

        match &self.kind {
            ComponentKind::Literal(text) => {
                if remaining.starts_with(text.as_str()) {
                    Ok(span(from + text.len(), None))
                } else {
                    Err(Mismatch::new(
                        from,
                        format!("expected '{}' but found '{}'", text, preview(remaining)),
                    ))
                }
            }

            ComponentKind::LineSeparator => {
                if remaining.is_empty() {
                    Ok(span(from, None))
                } else {
                    Err(Mismatch::new(
                        from,
                        format!("expected end of line but found '{}'", preview(remaining)),
                    ))
                }
            }

            ComponentKind::Date(format) => {
                let len = match format.expected_len() {
                    Some(width) => {
                        let width = self
                            .modifier
                            .and_then(|m| m.min_width)
                            .map_or(width, |min| min.max(width));
                        byte_len_of_chars(remaining, width).ok_or_else(|| {
                            Mismatch::new(
                                from,
                                format!(
                                    "line ends before the {} characters of date format '{}'",
                                    width,
                                    format.source()
                                ),
                            )
                        })?
                    }
                    None => remaining.bytes().take_while(u8::is_ascii_digit).count(),
                };
                let field = self.unpad(&remaining[..len]);
                let millis = format
                    .parse(field)
                    .map_err(|reason| Mismatch::new(from, reason))?;
                Ok(span(from + len, Some(FieldValue::Timestamp(millis))))
            }

            ComponentKind::Exception => {
                let to = self.field_end(content, from, rest)?;
                let field = &content[from..to];
                if field.is_empty() {
                    return Ok(span(from, None));
                }
                match throwable_at_start(field) {
                    Some(text) => Ok(span(to, text_value(text))),
                    None => Err(Mismatch::new(
                        from,
                        format!(
                            "expected an exception rendering but found '{}'",
                            preview(field)
                        ),
                    )),
                }
            }

            ComponentKind::Level => {
                let to = self.field_end(content, from, rest)?;
                let field = self.unpad(&content[from..to]);
                let level = field.trim_end_matches(' ').parse::<Level>().map_err(|_| {
                    Mismatch::new(from, format!("expected a level but found '{}'", preview(field)))
                })?;
                Ok(span(to, Some(FieldValue::Level(level))))
            }

            ComponentKind::Logger { .. }
            | ComponentKind::Thread
            | ComponentKind::Message
            | ComponentKind::Unknown { .. } => {
                let to = self.field_end(content, from, rest)?;
                let raw_field = &content[from..to];
                if self.modifier.is_some_and(|m| m.exceeds_max(raw_field)) {
                    return Err(Mismatch::new(
                        from,
                        format!("{} '{}' is wider than its maximum width", self.describe(), preview(raw_field)),
                    ));
                }
                Ok(span(to, text_value(self.unpad(raw_field))))
            }
        }
    }

    /// End offset of a variable-width field starting at `from`
    fn field_end(&self, content: &str, from: usize, rest: &[Component]) -> Result<usize, Mismatch> {
        let remaining = &content[from..];

        if let Some(width) = self.modifier.and_then(|m| m.fixed_width()) {
            return byte_len_of_chars(remaining, width)
                .map(|len| from + len)
                .ok_or_else(|| {
                    Mismatch::new(from, format!("{} is shorter than its fixed width {}", self.describe(), width))
                });
        }

        let next = match rest.first() {
            Some(next) => next,
            None => return Ok(content.len()),
        };

        match &next.kind {
            ComponentKind::LineSeparator => Ok(content.len()),

            ComponentKind::Literal(text) => {
                if let Some(end) = enclosed_end(content, from, text)? {
                    return Ok(end);
                }
                // left padding of a right-justified field may look like the separator
                let padding = match self.modifier {
                    Some(m) if m.right_justified && m.min_width.is_some() => {
                        remaining.len() - remaining.trim_start_matches(' ').len()
                    }
                    _ => 0,
                };
                let start = from + padding;
                content[start..].find(text.as_str()).map(|pos| start + pos).ok_or_else(|| {
                    Mismatch::new(
                        from,
                        format!("expected '{}' after the {}", text, self.describe()),
                    )
                })
            }

            ComponentKind::Exception => {
                // the exception owns everything from the throwable onwards
                let end = next.field_end(content, from, &rest[1..])?;
                Ok(find_throwable(&content[from..end]).map_or(end, |pos| from + pos))
            }

            _ => self.adjacent_end(content, from, next),
        }
    }

    /// End of a field that is directly followed by another field
    fn adjacent_end(&self, content: &str, from: usize, next: &Component) -> Result<usize, Mismatch> {
        let remaining = &content[from..];

        if let Some(max) = self.modifier.and_then(|m| m.max_width) {
            let len = byte_len_of_chars(remaining, max).unwrap_or(remaining.len());
            return Ok(from + len);
        }

        if let ComponentKind::Level = self.kind {
            let padding = remaining.len() - remaining.trim_start_matches(' ').len();
            if let Some((_, len)) = Level::match_prefix(&remaining[padding..]) {
                let mut end = padding + len;
                let min = self.modifier.and_then(|m| m.min_width).unwrap_or(0);
                while end < min && remaining[end..].starts_with(' ') {
                    end += 1;
                }
                return Ok(from + end);
            }
            return Err(Mismatch::new(
                from,
                format!("expected a level but found '{}'", preview(remaining)),
            ));
        }

        Err(Mismatch::new(
            from,
            format!(
                "cannot tell where the {} ends: it is directly followed by the {}",
                self.describe(),
                next.describe()
            ),
        ))
    }

    /// Write a matched value into the event; a missing value is ignored
    pub fn inject(&self, value: Option<FieldValue>, event: &mut Event) {
        let value = match value {
            Some(value) => value,
            None => return,
        };

        match (&self.kind, value) {
            (ComponentKind::Date(_), FieldValue::Timestamp(millis)) => event.timestamp = Some(millis),
            (ComponentKind::Level, FieldValue::Level(level)) => event.level = Some(level),
            (ComponentKind::Logger { .. }, FieldValue::Text(text)) => event.logger = Some(text),
            (ComponentKind::Thread, FieldValue::Text(text)) => event.thread_name = Some(text),
            (ComponentKind::Message, FieldValue::Text(text)) => event.message = Some(text),
            (ComponentKind::Exception, FieldValue::Text(text)) => {
                event.exception_rendering = Some(text)
            }
            _ => {}
        }
    }

    /// Render the event field this component stands for
    pub fn render(&self, event: &Event, out: &mut String) {
        let value: String = match &self.kind {
            ComponentKind::Literal(text) => {
                out.push_str(text);
                return;
            }
            ComponentKind::LineSeparator => {
                out.push('\n');
                return;
            }
            ComponentKind::Date(format) => event.timestamp.map(|ms| format.format(ms)).unwrap_or_default(),
            ComponentKind::Level => event.level.map(|l| l.to_string()).unwrap_or_default(),
            ComponentKind::Logger { precision } => {
                abbreviate_logger(event.logger.as_deref().unwrap_or(""), *precision).to_string()
            }
            ComponentKind::Thread => event.thread_name.clone().unwrap_or_default(),
            ComponentKind::Message => event.message.clone().unwrap_or_default(),
            ComponentKind::Exception => match &event.exception_rendering {
                Some(text) => format!(": {}", text),
                None => String::new(),
            },
            ComponentKind::Unknown { .. } => String::new(),
        };

        match &self.modifier {
            Some(modifier) => out.push_str(&modifier.apply(&value)),
            None => out.push_str(&value),
        }
    }
}

fn text_value(text: &str) -> Option<FieldValue> {
    if text.is_empty() {
        None
    } else {
        Some(FieldValue::Text(text.to_string()))
    }
}

/// If `from` sits right after an opening marker and `next_literal` starts
/// with its closer, find the balanced end of the enclosed field.
fn enclosed_end(content: &str, from: usize, next_literal: &str) -> Result<Option<usize>, Mismatch> {
    let open = match content[..from].chars().next_back() {
        Some(open) => open,
        None => return Ok(None),
    };
    let close = match closing_marker(open) {
        Some(close) if next_literal.starts_with(close) => close,
        _ => return Ok(None),
    };

    match scan_balanced(content, from - open.len_utf8(), open, close) {
        Ok(Some(enclosed)) => Ok(Some(enclosed.next - close.len_utf8())),
        Ok(None) => Ok(None),
        Err(unbalanced) => Err(Mismatch::new(unbalanced.open, unbalanced.to_string())),
    }
}

/// Byte offset of the `": "` that starts a throwable rendering in `text`
pub fn find_throwable(text: &str) -> Option<usize> {
    THROWABLE.find(text).map(|m| m.start())
}

/// The throwable rendering when `field` starts with one, without the `": "`
fn throwable_at_start(field: &str) -> Option<&str> {
    match THROWABLE.find(field) {
        Some(m) if m.start() == 0 => Some(&field[2..]),
        _ => None,
    }
}

/// Keep the last `precision` dot-separated segments of a logger name
pub fn abbreviate_logger(name: &str, precision: Option<usize>) -> &str {
    let precision = match precision {
        Some(p) if p > 0 => p,
        _ => return name,
    };
    match name.rmatch_indices('.').nth(precision - 1) {
        Some((pos, _)) => &name[pos + 1..],
        None => name,
    }
}

fn preview(text: &str) -> String {
    const MAX: usize = 24;
    if text.chars().count() > MAX {
        let cut: String = text.chars().take(MAX).collect();
        format!("{}...", cut)
    } else {
        text.to_string()
    }
}

/// Outcome of offering one character to a component builder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddResult {
    /// Consumed; more characters may follow
    Accepted,
    /// Consumed; the component is now complete
    Last,
    /// Not consumed; the component is complete and the character belongs to
    /// whatever comes next
    NotAccepted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BuildState {
    /// Literal text, or a conversion that still waits for its identifier
    Open,
    /// Identifier seen; an optional `{...}` may follow
    AwaitingOption,
    /// Inside `{...}`
    ReadingOption,
    Closed,
}

/// Builds one component from the pattern a character at a time
#[derive(Debug, Clone)]
pub struct ComponentBuilder {
    identifier: Option<char>,
    is_conversion: bool,
    modifier: Option<FormatModifier>,
    literal: String,
    option: Option<String>,
    state: BuildState,
    /// Position of the first character in the pattern, for error messages
    position: usize,
}

impl ComponentBuilder {
    /// Builder for a run of literal text
    pub fn literal(position: usize) -> Self {
        ComponentBuilder {
            identifier: None,
            is_conversion: false,
            modifier: None,
            literal: String::new(),
            option: None,
            state: BuildState::Open,
            position,
        }
    }

    /// Builder for a conversion; `prefix` is the `%` plus any modifier literal
    pub fn conversion(prefix: &str, modifier: Option<FormatModifier>, position: usize) -> Self {
        ComponentBuilder {
            identifier: None,
            is_conversion: true,
            modifier,
            literal: prefix.to_string(),
            option: None,
            state: BuildState::Open,
            position,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.state == BuildState::Closed
    }

    pub fn add(&mut self, ch: char) -> Result<AddResult, CompileError> {
        match self.state {
            BuildState::Closed => Err(CompileError::ComponentClosed {
                component: self.literal.clone(),
                character: ch,
            }),

            BuildState::Open if !self.is_conversion => {
                if ch == '%' {
                    self.state = BuildState::Closed;
                    Ok(AddResult::NotAccepted)
                } else {
                    self.literal.push(ch);
                    Ok(AddResult::Accepted)
                }
            }

            BuildState::Open => {
                if !ch.is_ascii_alphabetic() {
                    return Err(CompileError::UnknownConversion {
                        character: ch,
                        position: self.position + self.literal.len(),
                    });
                }
                self.identifier = Some(ch);
                self.literal.push(ch);
                match ch {
                    // these take no option
                    'p' | 't' | 'n' | 'm' | 's' | 'E' => {
                        self.state = BuildState::Closed;
                        Ok(AddResult::Last)
                    }
                    _ => {
                        self.state = BuildState::AwaitingOption;
                        Ok(AddResult::Accepted)
                    }
                }
            }

            BuildState::AwaitingOption => {
                if ch == '{' {
                    self.literal.push(ch);
                    self.option = Some(String::new());
                    self.state = BuildState::ReadingOption;
                    Ok(AddResult::Accepted)
                } else {
                    self.state = BuildState::Closed;
                    Ok(AddResult::NotAccepted)
                }
            }

            BuildState::ReadingOption => {
                self.literal.push(ch);
                if ch == '}' {
                    self.state = BuildState::Closed;
                    Ok(AddResult::Last)
                } else {
                    if let Some(option) = self.option.as_mut() {
                        option.push(ch);
                    }
                    Ok(AddResult::Accepted)
                }
            }
        }
    }

    /// Finish the component. Called when the builder closed itself or the
    /// pattern ended.
    pub fn build(self) -> Result<Component, CompileError> {
        match self.state {
            BuildState::ReadingOption => {
                return Err(CompileError::UnterminatedOption {
                    position: self.position,
                })
            }
            BuildState::Open if self.is_conversion => {
                return Err(CompileError::DanglingMarker {
                    position: self.position,
                })
            }
            _ => {}
        }

        let identifier = match self.identifier {
            Some(identifier) => identifier,
            None => return Ok(Component::literal_text(&self.literal)),
        };

        let kind = match identifier {
            'd' => match &self.option {
                Some(body) => ComponentKind::Date(DateFormat::resolve(body)?),
                None => ComponentKind::Date(DateFormat::default()),
            },
            'p' => ComponentKind::Level,
            'c' => ComponentKind::Logger {
                precision: match &self.option {
                    Some(body) => Some(body.trim().parse::<usize>().map_err(|_| {
                        CompileError::InvalidModifier {
                            literal: body.clone(),
                            reason: "logger precision must be a number".to_string(),
                        }
                    })?),
                    None => None,
                },
            },
            't' => ComponentKind::Thread,
            'n' => ComponentKind::LineSeparator,
            'm' | 's' => ComponentKind::Message,
            'E' => ComponentKind::Exception,
            other => ComponentKind::Unknown {
                conversion: other,
                option: self.option.clone(),
            },
        };

        Ok(Component {
            kind,
            identifier: Some(identifier),
            modifier: self.modifier,
            literal: self.literal,
        })
    }
}
