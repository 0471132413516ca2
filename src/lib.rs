// src/lib.rs
pub mod colors;
pub mod error;
pub mod event;
pub mod formatters;
pub mod heuristic;
pub mod output_format;
pub mod parser;
pub mod pattern;
pub mod pipeline;
pub mod scanner;

pub use error::*;

pub use event::{AppendMode, Event, EventRecord, Level, StreamItem};
pub use heuristic::{HeuristicMatch, HeuristicMatcher};
pub use output_format::{OutputFormat, OutputFormatter};
pub use parser::{LineOutcome, Parser};
pub use pattern::{FormatModifier, PatternLayout, JBOSS_DEFAULT_PATTERN};
pub use pipeline::config::{ErrorStrategy, PipelineConfig};
pub use pipeline::context::{ProcessResult, ProcessingStats};
pub use pipeline::processors::{
    CountProcessor, ExcludeLoggerProcessor, GrepProcessor, LevelFilterProcessor,
};
pub use pipeline::stream::{EventProcessor, StreamPipeline};
