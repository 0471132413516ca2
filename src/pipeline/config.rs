use crate::output_format::OutputFormat;

/// Configuration for pipeline behavior
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub error_strategy: ErrorStrategy,
    pub max_line_length: usize,
    /// Conversion pattern of the input; `None` selects the heuristic matcher
    pub pattern: Option<String>,
    pub output_format: OutputFormat,
    /// Layout used by `OutputFormat::Layout`; defaults to the input pattern
    pub output_pattern: Option<String>,
    /// None = auto-detect, Some(true/false) = forced
    pub color_preference: Option<bool>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            error_strategy: ErrorStrategy::Skip,
            max_line_length: 1048576, // 1MB
            pattern: None,
            output_format: OutputFormat::default(),
            output_pattern: None,
            color_preference: None,
        }
    }
}

/// What to do after a fatal parse error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorStrategy {
    /// Abandon the current file and continue with the next one
    Skip,
    /// Stop processing on first error
    FailFast,
}
