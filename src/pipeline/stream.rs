// src/pipeline/stream.rs
use std::io::{BufRead, Write};
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::error::ProcessingError;
use crate::event::{Event, StreamItem};
use crate::output_format::OutputFormatter;
use crate::parser::{LineOutcome, Parser};
use crate::pattern::{PatternLayout, JBOSS_DEFAULT_PATTERN};
use crate::pipeline::config::{ErrorStrategy, PipelineConfig};
use crate::pipeline::context::{ProcessResult, ProcessingStats};

/// One procedure applied to every completed event
pub trait EventProcessor: Send {
    fn process(&mut self, event: &Event) -> ProcessResult;
    fn name(&self) -> &str;
    /// Summary lines written once all input is done
    fn finish(&mut self) -> Vec<String> {
        Vec::new()
    }
}

/// Main pipeline orchestrator
pub struct StreamPipeline {
    processors: Vec<Box<dyn EventProcessor>>,
    layout: Option<PatternLayout>,
    formatter: OutputFormatter,
    config: PipelineConfig,
    stats: ProcessingStats,
}

impl StreamPipeline {
    /// Compiles the input and output layouts up front, so a bad pattern fails
    /// before any line is read.
    pub fn new(config: PipelineConfig) -> Result<Self, ProcessingError> {
        let layout = config
            .pattern
            .as_deref()
            .map(PatternLayout::compile)
            .transpose()?;

        let output_layout = match (&config.output_pattern, &layout) {
            (Some(pattern), _) => PatternLayout::compile(pattern)?,
            (None, Some(layout)) => layout.clone(),
            (None, None) => PatternLayout::compile(JBOSS_DEFAULT_PATTERN)?,
        };

        if let Some(layout) = &layout {
            debug!(
                pattern = layout.literal(),
                components = layout.components().len(),
                "compiled input layout"
            );
        }

        let formatter =
            OutputFormatter::new(config.output_format, config.color_preference, output_layout);

        Ok(StreamPipeline {
            processors: Vec::new(),
            layout,
            formatter,
            config,
            stats: ProcessingStats::default(),
        })
    }

    pub fn add_processor(&mut self, processor: Box<dyn EventProcessor>) {
        self.processors.push(processor);
    }

    /// Process a single file/stream with a fresh parser
    pub fn process_stream<R: BufRead, W: Write>(
        &mut self,
        mut input: R,
        output: &mut W,
        filename: Option<&str>,
    ) -> Result<ProcessingStats, ProcessingError> {
        let start_time = Instant::now();
        let source_name = filename.unwrap_or("<stdin>");
        let mut parser = Parser::new(self.layout.clone());
        let mut file_stats = ProcessingStats::default();
        let mut buffer = String::new();
        let mut line_number = 0;

        loop {
            buffer.clear();
            if input.read_line(&mut buffer)? == 0 {
                break;
            }
            line_number += 1;
            file_stats.lines_read += 1;

            let line = buffer.strip_suffix('\n').unwrap_or(&buffer);

            if line.len() > self.config.max_line_length {
                let error = ProcessingError::LineTooLong {
                    length: line.len(),
                    max_length: self.config.max_line_length,
                };
                match self.config.error_strategy {
                    ErrorStrategy::FailFast => return Err(error),
                    ErrorStrategy::Skip => {
                        warn!(file = source_name, line = line_number, "line too long, skipping");
                        file_stats.lines_skipped += 1;
                        continue;
                    }
                }
            }

            match parser.feed(line_number, line) {
                Ok(LineOutcome::Skipped) => file_stats.lines_skipped += 1,
                Ok(_) => {}
                Err(source) => match self.config.error_strategy {
                    ErrorStrategy::FailFast => {
                        return Err(ProcessingError::Parse {
                            source_name: source_name.to_string(),
                            source,
                        })
                    }
                    ErrorStrategy::Skip => {
                        error!(file = source_name, "{}", source);
                        file_stats.fatal_errors += 1;
                        break;
                    }
                },
            }

            let completed = parser.flush();
            if !self.handle_events(completed, output, &mut file_stats)? {
                return Ok(self.finish_stream(file_stats, start_time));
            }
        }

        let remaining: Vec<Event> = parser
            .close()
            .into_iter()
            .filter_map(|item| match item {
                StreamItem::Event(event) => Some(event),
                StreamItem::EndOfStream => None,
            })
            .collect();
        self.handle_events(remaining, output, &mut file_stats)?;

        info!(
            file = source_name,
            lines = file_stats.lines_read,
            events = file_stats.events_parsed,
            written = file_stats.events_written,
            "finished stream"
        );
        Ok(self.finish_stream(file_stats, start_time))
    }

    /// Run completed events through the procedures and write the survivors.
    /// Returns false once the reader of the output went away.
    fn handle_events<W: Write>(
        &mut self,
        events: Vec<Event>,
        output: &mut W,
        stats: &mut ProcessingStats,
    ) -> Result<bool, ProcessingError> {
        for event in events {
            stats.events_parsed += 1;

            match self.apply_processors(&event) {
                ProcessResult::Keep => {}
                ProcessResult::Skip => {
                    stats.events_filtered += 1;
                    continue;
                }
                ProcessResult::Consume => continue,
            }

            match self.formatter.write_event(output, &event) {
                Ok(()) => stats.events_written += 1,
                Err(ProcessingError::IoError(e)) if e.kind() == std::io::ErrorKind::BrokenPipe => {
                    return Ok(false)
                }
                Err(e) => return Err(e),
            }
        }
        Ok(true)
    }

    fn apply_processors(&mut self, event: &Event) -> ProcessResult {
        for processor in &mut self.processors {
            match processor.process(event) {
                ProcessResult::Keep => {}
                other => return other,
            }
        }
        ProcessResult::Keep
    }

    fn finish_stream(&mut self, mut file_stats: ProcessingStats, start: Instant) -> ProcessingStats {
        file_stats.processing_time = start.elapsed();
        self.stats.absorb(&file_stats);
        file_stats
    }

    /// Write the summaries of all procedures. Returns the number of lines written.
    pub fn finish<W: Write>(&mut self, output: &mut W) -> Result<usize, ProcessingError> {
        let mut written = 0;
        for processor in &mut self.processors {
            for line in processor.finish() {
                writeln!(output, "{}", line)?;
                written += 1;
            }
        }
        Ok(written)
    }

    /// Get current accumulated stats
    pub fn get_stats(&self) -> &ProcessingStats {
        &self.stats
    }
}
