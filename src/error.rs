/// Errors raised while compiling a conversion pattern
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CompileError {
    #[error("Conversion pattern is empty")]
    EmptyPattern,

    #[error("'%' marker at position {position} is not followed by any component")]
    DanglingMarker { position: usize },

    #[error("Unknown conversion character '{character}' at position {position}")]
    UnknownConversion { character: char, position: usize },

    #[error("Invalid format modifier '{literal}': {reason}")]
    InvalidModifier { literal: String, reason: String },

    #[error("Invalid date format '{format}': {reason}")]
    InvalidDateFormat { format: String, reason: String },

    #[error("Unterminated '{{' option starting at position {position}")]
    UnterminatedOption { position: usize },

    #[error("Component '{component}' is closed and cannot accept '{character}'")]
    ComponentClosed { component: String, character: char },
}

/// Fatal errors raised while turning lines into events
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("{}", describe_match(.line, .offset, .message))]
    Match {
        line: usize,
        offset: Option<usize>,
        message: String,
    },

    #[error("Parser stopped after a fatal error on line {line}")]
    Halted { line: usize },
}

fn describe_match(line: &usize, offset: &Option<usize>, message: &str) -> String {
    match offset {
        Some(offset) => format!("line {}, offset {}: {}", line, offset, message),
        None => format!("line {}: {}", line, message),
    }
}

impl ParseError {
    pub fn at(line: usize, offset: usize, message: impl Into<String>) -> Self {
        ParseError::Match {
            line,
            offset: Some(offset),
            message: message.into(),
        }
    }

    pub fn on_line(line: usize, message: impl Into<String>) -> Self {
        ParseError::Match {
            line,
            offset: None,
            message: message.into(),
        }
    }

    /// 1-based line number the error refers to
    pub fn line(&self) -> usize {
        match self {
            ParseError::Match { line, .. } | ParseError::Halted { line } => *line,
        }
    }

    pub fn offset(&self) -> Option<usize> {
        match self {
            ParseError::Match { offset, .. } => *offset,
            ParseError::Halted { .. } => None,
        }
    }
}

/// Errors surfaced by the stream pipeline
#[derive(Debug, thiserror::Error)]
pub enum ProcessingError {
    #[error("Parse error in '{source_name}': {source}")]
    Parse {
        source_name: String,
        #[source]
        source: ParseError,
    },

    #[error("Invalid conversion pattern: {0}")]
    Compile(#[from] CompileError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Line too long: {length} > {max_length}")]
    LineTooLong { length: usize, max_length: usize },

    #[error("Output error: {0}")]
    OutputError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_error_display() {
        let err = ParseError::at(12, 4, "expecting '[...]'");
        assert_eq!(err.to_string(), "line 12, offset 4: expecting '[...]'");
        assert_eq!(err.line(), 12);
        assert_eq!(err.offset(), Some(4));

        let err = ParseError::on_line(3, "no level");
        assert_eq!(err.to_string(), "line 3: no level");
        assert_eq!(err.offset(), None);
    }
}
