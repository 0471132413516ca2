// src/parser.rs - Line-by-line event reconstruction

use crate::error::{CompileError, ParseError};
use crate::event::{Event, StreamItem};
use crate::heuristic::HeuristicMatcher;
use crate::pattern::{Mismatch, PatternLayout};
use tracing::{debug, warn};

/// What happened to one line fed to the parser
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineOutcome {
    /// The line started a new event
    Started,
    /// The line was appended to the in-flight event
    Continued,
    /// Continuation line with no event to attach to; discarded
    Skipped,
}

#[derive(Debug, Clone)]
enum Matcher {
    Layout(PatternLayout),
    Heuristic(HeuristicMatcher),
}

impl Matcher {
    /// A new event when `content` starts one
    fn start_event(
        &self,
        line_number: usize,
        raw_line: &str,
        content: &str,
    ) -> Result<Option<Event>, Mismatch> {
        match self {
            Matcher::Layout(layout) => Ok(layout
                .match_line(content)?
                .map(|matched| layout.build_event(line_number, raw_line, matched))),
            Matcher::Heuristic(matcher) => Ok(matcher
                .match_line(content)?
                .map(|matched| matched.into_event(line_number, raw_line))),
        }
    }
}

/// In-flight event plus the events completed since the last flush
#[derive(Debug, Default)]
struct Accumulator {
    in_flight: Option<Event>,
    completed: Vec<Event>,
}

impl Accumulator {
    fn start(&mut self, event: Event) {
        if let Some(previous) = self.in_flight.replace(event) {
            self.completed.push(previous);
        }
    }

    /// False when there is no event to append to
    fn append(&mut self, raw_line: &str, content: &str) -> bool {
        match self.in_flight.as_mut() {
            Some(event) => {
                event.append_line(raw_line, content);
                true
            }
            None => false,
        }
    }

    fn drain(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.completed)
    }

    fn finish(&mut self) -> Vec<Event> {
        let mut events = self.drain();
        events.extend(self.in_flight.take());
        events
    }
}

/// Turns a stream of lines into events, using a compiled layout when one is
/// configured and the heuristic matcher otherwise.
///
/// One parser is bound to one stream: line numbers are expected to increase
/// and `close` is called once at the end.
#[derive(Debug)]
pub struct Parser {
    matcher: Matcher,
    state: Accumulator,
    /// Line of the fatal error that stopped the parser
    halted_at: Option<usize>,
}

impl Parser {
    pub fn new(layout: Option<PatternLayout>) -> Self {
        let matcher = match layout {
            Some(layout) => Matcher::Layout(layout),
            None => Matcher::Heuristic(HeuristicMatcher::new()),
        };
        Parser {
            matcher,
            state: Accumulator::default(),
            halted_at: None,
        }
    }

    pub fn heuristic() -> Self {
        Parser::new(None)
    }

    /// Compile `pattern` and build a parser around it
    pub fn with_pattern(pattern: &str) -> Result<Self, CompileError> {
        let layout = PatternLayout::compile(pattern)?;
        debug!(pattern, components = layout.components().len(), "compiled layout");
        Ok(Parser::new(Some(layout)))
    }

    pub fn is_halted(&self) -> bool {
        self.halted_at.is_some()
    }

    /// True while an event is still collecting continuation lines
    pub fn has_in_flight(&self) -> bool {
        self.state.in_flight.is_some()
    }

    /// Process one line. `raw_line` must not contain the `\n` terminator; a
    /// trailing `\r` is kept in `raw` but not in the extracted fields.
    pub fn feed(&mut self, line_number: usize, raw_line: &str) -> Result<LineOutcome, ParseError> {
        if let Some(line) = self.halted_at {
            return Err(ParseError::Halted { line });
        }

        let content = raw_line.strip_suffix('\r').unwrap_or(raw_line);

        match self.matcher.start_event(line_number, raw_line, content) {
            Ok(Some(event)) => {
                self.state.start(event);
                Ok(LineOutcome::Started)
            }
            Ok(None) => {
                if self.state.append(raw_line, content) {
                    Ok(LineOutcome::Continued)
                } else {
                    warn!(line = line_number, "discarding line outside of any event");
                    Ok(LineOutcome::Skipped)
                }
            }
            Err(mismatch) => {
                self.halted_at = Some(line_number);
                Err(ParseError::at(line_number, mismatch.offset, mismatch.message))
            }
        }
    }

    /// Process one line and return the events it completed
    pub fn parse(&mut self, line_number: usize, raw_line: &str) -> Result<Vec<Event>, ParseError> {
        self.feed(line_number, raw_line)?;
        Ok(self.flush())
    }

    /// Completed events; never the one still in flight
    pub fn flush(&mut self) -> Vec<Event> {
        self.state.drain()
    }

    /// Every remaining event, in-flight one included, then the end marker
    pub fn close(&mut self) -> Vec<StreamItem> {
        let mut items: Vec<StreamItem> = self
            .state
            .finish()
            .into_iter()
            .map(StreamItem::Event)
            .collect();
        items.push(StreamItem::EndOfStream);
        items
    }
}
