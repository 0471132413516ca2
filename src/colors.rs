use crate::event::Level;
use is_terminal::IsTerminal;

/// ANSI color codes for logfmt output formatting
#[derive(Debug, Clone)]
pub struct ColorScheme {
    pub key: &'static str,         // Cyan for field names
    pub equals: &'static str,      // White for = separator
    pub timestamp: &'static str,   // Blue for timestamp fields
    pub level_error: &'static str, // Red for error/fatal levels
    pub level_warn: &'static str,  // Yellow for warn levels
    pub level_info: &'static str,  // Green for info levels
    pub level_debug: &'static str, // Gray for debug levels
    pub level_trace: &'static str, // Dim cyan for trace levels
    pub reset: &'static str,       // Reset to default color
}

impl ColorScheme {
    pub fn new(use_colors: bool) -> Self {
        if use_colors {
            Self {
                key: "\x1b[36m",
                equals: "\x1b[37m",
                timestamp: "\x1b[34m",
                level_error: "\x1b[31m",
                level_warn: "\x1b[33m",
                level_info: "\x1b[32m",
                level_debug: "\x1b[90m",
                level_trace: "\x1b[2;36m",
                reset: "\x1b[0m",
            }
        } else {
            Self {
                key: "",
                equals: "",
                timestamp: "",
                level_error: "",
                level_warn: "",
                level_info: "",
                level_debug: "",
                level_trace: "",
                reset: "",
            }
        }
    }

    pub fn level_color(&self, level: Level) -> &'static str {
        match level {
            Level::Fatal | Level::Error => self.level_error,
            Level::Warn => self.level_warn,
            Level::Info => self.level_info,
            Level::Debug => self.level_debug,
            Level::Trace => self.level_trace,
        }
    }
}

/// Colors by default only when stdout is a terminal and NO_COLOR is unset
pub fn should_use_colors() -> bool {
    std::env::var_os("NO_COLOR").is_none() && std::io::stdout().is_terminal()
}
