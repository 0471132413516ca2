use crate::colors::should_use_colors;
use crate::error::ProcessingError;
use crate::event::Event;
use crate::formatters::layout::LayoutFormatter;
use crate::formatters::logfmt::LogfmtFormatter;
use crate::formatters::EventFormatter;
use crate::pattern::PatternLayout;
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    #[value(name = "raw", help = "Every line of the event exactly as read")]
    Raw,
    #[value(name = "jsonl", help = "JSON Lines format (one JSON object per event)")]
    Jsonl,
    #[value(name = "logfmt", help = "Logfmt format (key=value pairs)")]
    Logfmt,
    #[value(name = "csv", help = "Comma-separated values")]
    Csv,
    #[value(name = "tsv", help = "Tab-separated values")]
    Tsv,
    #[value(name = "layout", help = "Re-rendered through a conversion pattern")]
    Layout,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "raw" => Ok(OutputFormat::Raw),
            "jsonl" => Ok(OutputFormat::Jsonl),
            "logfmt" => Ok(OutputFormat::Logfmt),
            "csv" => Ok(OutputFormat::Csv),
            "tsv" => Ok(OutputFormat::Tsv),
            "layout" => Ok(OutputFormat::Layout),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}

pub struct OutputFormatter {
    format: OutputFormat,
    logfmt: LogfmtFormatter,
    layout: LayoutFormatter,
    header_written: bool,
}

impl OutputFormatter {
    /// `color_preference`: None = auto-detect, Some(true/false) = forced
    pub fn new(format: OutputFormat, color_preference: Option<bool>, layout: PatternLayout) -> Self {
        let use_colors = format == OutputFormat::Logfmt
            && color_preference.unwrap_or_else(should_use_colors);
        OutputFormatter {
            format,
            logfmt: LogfmtFormatter::new(use_colors),
            layout: LayoutFormatter::new(layout),
            header_written: false,
        }
    }

    pub fn write_event<W: Write>(&mut self, output: &mut W, event: &Event) -> Result<(), ProcessingError> {
        match self.format {
            OutputFormat::Raw => writeln!(output, "{}", event.raw)?,
            OutputFormat::Jsonl => self.write_jsonl(output, event)?,
            OutputFormat::Logfmt => writeln!(output, "{}", self.logfmt.format_event(event))?,
            OutputFormat::Csv => self.write_separated_values(output, event, b',')?,
            OutputFormat::Tsv => self.write_separated_values(output, event, b'\t')?,
            OutputFormat::Layout => writeln!(output, "{}", self.layout.format_event(event))?,
        }
        Ok(())
    }

    fn write_jsonl<W: Write>(&mut self, output: &mut W, event: &Event) -> Result<(), ProcessingError> {
        let json_line = serde_json::to_string(&event.to_record())
            .map_err(|e| ProcessingError::OutputError(format!("JSON encoding error: {}", e)))?;
        writeln!(output, "{}", json_line)?;
        Ok(())
    }

    fn write_separated_values<W: Write>(
        &mut self,
        output: &mut W,
        event: &Event,
        delimiter: u8,
    ) -> Result<(), ProcessingError> {
        let csv_error = |e: csv::Error| ProcessingError::OutputError(format!("CSV encoding error: {}", e));

        let mut writer = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .from_writer(Vec::new());

        if !self.header_written {
            writer.write_record(Event::FIELD_NAMES).map_err(csv_error)?;
            self.header_written = true;
        }

        let row: Vec<String> = Event::FIELD_NAMES
            .iter()
            .map(|name| event.field(name).unwrap_or_default())
            .collect();
        writer.write_record(&row).map_err(csv_error)?;

        let bytes = writer
            .into_inner()
            .map_err(|e| ProcessingError::OutputError(format!("CSV encoding error: {}", e)))?;
        output.write_all(&bytes)?;
        Ok(())
    }
}
