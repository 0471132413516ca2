// src/pattern/mod.rs - Conversion pattern compiler and layout matcher

pub mod component;
pub mod date;
pub mod modifier;

pub use component::{
    AddResult, Component, ComponentBuilder, ComponentKind, FieldValue, Mismatch, ParsedSpan,
};
pub use date::{DateFormat, DatePreset};
pub use modifier::FormatModifier;

use crate::error::CompileError;
use crate::event::{AppendMode, Event};
use std::fmt;
use std::str::FromStr;

/// Layout used by JBoss EAP / WildFly for server.log
pub const JBOSS_DEFAULT_PATTERN: &str = "%d{HH:mm:ss,SSS} %-5p [%c] (%t) %s%E%n";

/// A compiled conversion pattern
#[derive(Debug, Clone, PartialEq)]
pub struct PatternLayout {
    literal: String,
    components: Vec<Component>,
}

impl PatternLayout {
    /// Tokenize `pattern` into its component sequence
    pub fn compile(pattern: &str) -> Result<Self, CompileError> {
        if pattern.is_empty() {
            return Err(CompileError::EmptyPattern);
        }

        let mut compiler = Compiler::default();
        let mut chars = pattern.char_indices();

        while let Some((pos, ch)) = chars.next() {
            if let Some(builder) = compiler.builder.as_mut() {
                match builder.add(ch)? {
                    AddResult::Accepted => continue,
                    AddResult::Last => {
                        compiler.finish()?;
                        continue;
                    }
                    AddResult::NotAccepted => compiler.finish()?,
                }
            }

            if ch != '%' {
                let mut builder = ComponentBuilder::literal(pos);
                builder.add(ch)?;
                compiler.builder = Some(builder);
                continue;
            }

            // modifier characters up to the conversion identifier
            let mut modifier_literal = String::new();
            let identifier = loop {
                match chars.next() {
                    None => return Err(CompileError::DanglingMarker { position: pos }),
                    Some((_, c)) if c.is_ascii_digit() || c == '.' || c == '-' => {
                        modifier_literal.push(c)
                    }
                    Some((_, c)) => break c,
                }
            };

            if identifier == '%' && modifier_literal.is_empty() {
                compiler.components.push(Component::escaped_percent());
                continue;
            }

            let modifier = if modifier_literal.is_empty() {
                None
            } else {
                Some(FormatModifier::parse(&modifier_literal)?)
            };
            let mut builder =
                ComponentBuilder::conversion(&format!("%{}", modifier_literal), modifier, pos);
            let result = builder.add(identifier)?;
            compiler.builder = Some(builder);
            if result == AddResult::Last {
                compiler.finish()?;
            }
        }

        compiler.finish()?;

        Ok(PatternLayout {
            literal: pattern.to_string(),
            components: compiler.components,
        })
    }

    /// The pattern this layout was compiled from
    pub fn literal(&self) -> &str {
        &self.literal
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    pub fn has_message(&self) -> bool {
        self.components
            .iter()
            .any(|c| matches!(c.kind(), ComponentKind::Message))
    }

    pub fn has_exception(&self) -> bool {
        self.components
            .iter()
            .any(|c| matches!(c.kind(), ComponentKind::Exception))
    }

    /// Index of the component that marks the start of an event: the first
    /// date, else the first level, else the first conversion.
    ///
    /// A line whose components up to and including the anchor do not match is
    /// a continuation line, not an error.
    pub fn anchor_index(&self) -> usize {
        let position = |pred: fn(&ComponentKind) -> bool| {
            self.components.iter().position(|c| pred(c.kind()))
        };
        position(|k| matches!(k, ComponentKind::Date(_)))
            .or_else(|| position(|k| matches!(k, ComponentKind::Level)))
            .or_else(|| position(|k| !matches!(k, ComponentKind::Literal(_))))
            .unwrap_or(self.components.len().saturating_sub(1))
    }

    /// Match one line (without its line terminator) against the layout.
    ///
    /// `Ok(None)` means the line does not start an event. A failure after the
    /// anchor matched is a `Mismatch`.
    pub fn match_line(&self, content: &str) -> Result<Option<LayoutMatch>, Mismatch> {
        let anchor = self.anchor_index();
        let mut spans = Vec::with_capacity(self.components.len());
        let mut pos = 0;

        for (index, component) in self.components.iter().enumerate() {
            match component.extract(content, pos, &self.components[index + 1..]) {
                Ok(span) => {
                    pos = span.to;
                    spans.push(span);
                }
                Err(_) if index <= anchor => return Ok(None),
                Err(mismatch) => return Err(mismatch),
            }
        }

        if pos < content.len() {
            return Err(Mismatch {
                offset: pos,
                message: format!("unexpected text after the layout: '{}'", &content[pos..]),
            });
        }

        Ok(Some(LayoutMatch { spans }))
    }

    /// Build a new event from a successful match
    pub fn build_event(&self, line_number: usize, raw_line: &str, matched: LayoutMatch) -> Event {
        let mut event = Event::new(line_number, raw_line);
        let mut exception_consumed = false;

        for (component, span) in self.components.iter().zip(matched.spans) {
            if matches!(component.kind(), ComponentKind::Exception) && !span.is_empty() {
                exception_consumed = true;
            }
            component.inject(span.value, &mut event);
        }

        event.append_mode = if exception_consumed {
            AppendMode::Exception
        } else if self.has_message() {
            AppendMode::Message
        } else if self.has_exception() {
            AppendMode::Exception
        } else {
            AppendMode::None
        };
        event
    }

    /// Render an event the way the logging framework would have written it
    pub fn format(&self, event: &Event) -> String {
        let mut out = String::new();
        for component in &self.components {
            component.render(event, &mut out);
        }
        out
    }
}

impl FromStr for PatternLayout {
    type Err = CompileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PatternLayout::compile(s)
    }
}

impl fmt::Display for PatternLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.literal)
    }
}

/// Spans of every component of a layout, in order
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutMatch {
    pub spans: Vec<ParsedSpan>,
}

#[derive(Default)]
struct Compiler {
    components: Vec<Component>,
    builder: Option<ComponentBuilder>,
}

impl Compiler {
    /// Build the pending component, if any
    fn finish(&mut self) -> Result<(), CompileError> {
        if let Some(builder) = self.builder.take() {
            self.components.push(builder.build()?);
        }
        Ok(())
    }
}
