use anyhow::Context;
use clap::{ArgAction, Parser};
use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::PathBuf;
use tracing::{debug, error};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use patlog::{
    CountProcessor, ErrorStrategy, ExcludeLoggerProcessor, GrepProcessor, Level,
    LevelFilterProcessor, OutputFormat, PipelineConfig, ProcessingError, StreamPipeline,
};

#[derive(Parser)]
#[command(name = "patlog")]
#[command(about = "Reconstruct structured events from log4j/JBoss style log files")]
#[command(version)]
struct Args {
    /// Input files (default: stdin)
    #[arg(value_name = "FILES")]
    input_files: Vec<PathBuf>,

    /// Conversion pattern of the input, e.g. '%d{HH:mm:ss,SSS} %-5p [%c] (%t) %s%E%n'.
    /// Without it, JBoss-style lines are recognized heuristically
    #[arg(short = 'p', long = "pattern", env = "PATLOG_PATTERN")]
    pattern: Option<String>,

    /// Output format
    #[arg(short = 'F', long = "output-format", value_enum, default_value = "raw")]
    output_format: OutputFormat,

    /// Conversion pattern used by the layout output format (default: the input pattern)
    #[arg(long, value_name = "PATTERN")]
    output_pattern: Option<String>,

    /// Minimum level to keep
    #[arg(long, value_name = "LEVEL", value_parser = parse_level)]
    level: Option<Level>,

    /// Keep only these levels (comma-separated)
    #[arg(long, value_delimiter = ',', value_parser = parse_level)]
    include_levels: Vec<Level>,

    /// Drop these levels (comma-separated)
    #[arg(long, value_delimiter = ',', value_parser = parse_level)]
    exclude_levels: Vec<Level>,

    /// Drop events whose logger starts with this prefix (repeatable)
    #[arg(long = "exclude-logger", value_name = "PREFIX", action = ArgAction::Append)]
    exclude_loggers: Vec<String>,

    /// Keep only events whose message or exception contains WORD
    #[arg(long, value_name = "WORD")]
    grep: Option<String>,

    /// Print event counts per level instead of the events
    #[arg(long)]
    count: bool,

    /// Stop at the first fatal error instead of skipping the rest of the file
    #[arg(long)]
    fail_fast: bool,

    /// Debug mode - show processing details
    #[arg(long)]
    debug: bool,

    /// Force colored output
    #[arg(long, overrides_with = "no_color")]
    color: bool,

    /// Disable colored output
    #[arg(long = "no-color", overrides_with = "color")]
    no_color: bool,

    /// Maximum line length
    #[arg(long, default_value = "1048576")] // 1MB
    max_line_length: usize,

    /// Buffer size for I/O
    #[arg(long, default_value = "65536")] // 64KB
    buffer_size: usize,

    /// Output file (default: stdout)
    #[arg(short = 'o', long = "output")]
    output_file: Option<PathBuf>,
}

impl Args {
    fn color_preference(&self) -> Option<bool> {
        if self.no_color {
            Some(false)
        } else if self.color {
            Some(true)
        } else {
            None
        }
    }
}

fn parse_level(s: &str) -> Result<Level, String> {
    s.to_uppercase().parse()
}

fn main() {
    let args = Args::parse();
    init_tracing(args.debug);

    match run(args) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("patlog: {:#}", e);
            std::process::exit(1);
        }
    }
}

fn init_tracing(debug: bool) {
    let default_filter = if debug { "patlog=debug" } else { "patlog=warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_target(false),
        )
        .init();
}

/// Returns the process exit code: 0 on success, 1 when a fatal error
/// occurred, 2 when nothing was written.
fn run(args: Args) -> anyhow::Result<i32> {
    let error_strategy = if args.fail_fast {
        ErrorStrategy::FailFast
    } else {
        ErrorStrategy::Skip
    };

    let config = PipelineConfig {
        error_strategy,
        max_line_length: args.max_line_length,
        pattern: args.pattern.clone(),
        output_format: args.output_format,
        output_pattern: args.output_pattern.clone(),
        color_preference: args.color_preference(),
    };

    let mut pipeline = StreamPipeline::new(config)?;

    if args.level.is_some() || !args.include_levels.is_empty() || !args.exclude_levels.is_empty() {
        let include = if args.include_levels.is_empty() {
            None
        } else {
            Some(args.include_levels.clone())
        };
        pipeline.add_processor(Box::new(LevelFilterProcessor::new(
            args.level,
            include,
            args.exclude_levels.clone(),
        )));
    }
    if !args.exclude_loggers.is_empty() {
        pipeline.add_processor(Box::new(ExcludeLoggerProcessor::new(
            args.exclude_loggers.clone(),
        )));
    }
    if let Some(keyword) = &args.grep {
        pipeline.add_processor(Box::new(GrepProcessor::new(keyword.as_str())));
    }
    if args.count {
        pipeline.add_processor(Box::new(CountProcessor::new()));
    }

    // Set up output
    let mut output: Box<dyn Write> = if let Some(output_path) = &args.output_file {
        let file = File::create(output_path)
            .with_context(|| format!("Failed to create output file '{}'", output_path.display()))?;
        Box::new(io::BufWriter::with_capacity(args.buffer_size, file))
    } else {
        Box::new(io::BufWriter::with_capacity(args.buffer_size, io::stdout()))
    };

    let mut failed = false;

    if args.input_files.is_empty() {
        let stdin = io::stdin();
        let input = BufReader::with_capacity(args.buffer_size, stdin.lock());
        pipeline
            .process_stream(input, &mut output, None)
            .context("Processing failed")?;
    } else {
        for path in &args.input_files {
            let name = path.display().to_string();
            let file = match File::open(path) {
                Ok(file) => file,
                Err(e) if error_strategy == ErrorStrategy::Skip => {
                    error!(file = %name, "cannot open: {}", e);
                    failed = true;
                    continue;
                }
                Err(e) => {
                    return Err(e).with_context(|| format!("Failed to open input file '{}'", name))
                }
            };
            let input = BufReader::with_capacity(args.buffer_size, file);
            match pipeline.process_stream(input, &mut output, Some(&name)) {
                Ok(stats) => debug!(file = %name, ?stats, "file done"),
                Err(e @ ProcessingError::Parse { .. }) => return Err(e.into()),
                Err(e) => return Err(e).with_context(|| format!("Processing '{}' failed", name)),
            }
        }
    }

    let summary_lines = pipeline.finish(&mut output)?;

    // Ensure output is flushed
    if let Err(e) = output.flush() {
        if e.kind() != io::ErrorKind::BrokenPipe {
            return Err(e.into());
        }
    }

    let stats = pipeline.get_stats();
    debug!(
        lines_read = stats.lines_read,
        events_parsed = stats.events_parsed,
        events_written = stats.events_written,
        events_filtered = stats.events_filtered,
        lines_skipped = stats.lines_skipped,
        fatal_errors = stats.fatal_errors,
        elapsed = ?stats.processing_time,
        rate = ?stats.rate(),
        "final statistics"
    );

    if failed || stats.fatal_errors > 0 {
        Ok(1)
    } else if stats.events_written == 0 && summary_lines == 0 {
        Ok(2)
    } else {
        Ok(0)
    }
}
