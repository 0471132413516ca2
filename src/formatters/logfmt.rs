use crate::colors::ColorScheme;
use crate::event::Event;
use crate::formatters::EventFormatter;

/// Standard logfmt formatter with colored output
pub struct LogfmtFormatter {
    colors: ColorScheme,
}

impl LogfmtFormatter {
    pub fn new(use_colors: bool) -> Self {
        Self {
            colors: ColorScheme::new(use_colors),
        }
    }

    /// Format a single key=value pair with appropriate colors
    pub fn format_key_value_pair(&self, key: &str, value: &str, value_color: &str) -> String {
        let colored_key = if self.colors.key.is_empty() {
            key.to_string()
        } else {
            format!("{}{}{}", self.colors.key, key, self.colors.reset)
        };

        let equals = if self.colors.equals.is_empty() {
            "=".to_string()
        } else {
            format!("{}={}", self.colors.equals, self.colors.reset)
        };

        let quoted_value = if needs_quoting(value) {
            format!("\"{}\"", escape(value))
        } else {
            value.to_string()
        };

        let colored_value = if value_color.is_empty() {
            quoted_value
        } else {
            format!("{}{}{}", value_color, quoted_value, self.colors.reset)
        };

        format!("{}{}{}", colored_key, equals, colored_value)
    }

    fn value_color(&self, key: &str, event: &Event) -> &'static str {
        match key {
            "timestamp" => self.colors.timestamp,
            "level" => event.level.map_or("", |l| self.colors.level_color(l)),
            _ => "",
        }
    }
}

impl EventFormatter for LogfmtFormatter {
    /// Fields in fixed order; missing fields are left out
    fn format_event(&self, event: &Event) -> String {
        Event::FIELD_NAMES
            .iter()
            .filter_map(|&key| {
                event
                    .field(key)
                    .map(|value| self.format_key_value_pair(key, &value, self.value_color(key, event)))
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Check if value needs to be quoted per logfmt rules
fn needs_quoting(value: &str) -> bool {
    value.is_empty()
        || value
            .chars()
            .any(|c| c == ' ' || c == '=' || c == '"' || c == '\\' || c.is_control())
}

/// Escape quotes, backslashes and line breaks so a record stays on one line
fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Level;

    fn sample() -> Event {
        let mut event = Event::new(12, "raw");
        event.timestamp = Some(36_930_001);
        event.level = Some(Level::Error);
        event.logger = Some("org.acme.Deployer".to_string());
        event.thread_name = Some("MSC service thread 1-2".to_string());
        event.message = Some("Deploy failed".to_string());
        event
    }

    #[test]
    fn test_field_order_and_quoting() {
        let formatter = LogfmtFormatter::new(false);
        assert_eq!(
            formatter.format_event(&sample()),
            "timestamp=1970-01-01T10:15:30.001Z level=ERROR logger=org.acme.Deployer \
             thread=\"MSC service thread 1-2\" message=\"Deploy failed\" line=12"
        );
    }

    #[test]
    fn test_multi_line_values_stay_on_one_line() {
        let mut event = sample();
        event.exception_rendering =
            Some("java.lang.IllegalStateException: \"boom\"\n\tat Foo.bar(Foo.java:1)".to_string());
        let out = LogfmtFormatter::new(false).format_event(&event);
        assert!(!out.contains('\n'));
        assert!(out.contains(
            "exception=\"java.lang.IllegalStateException: \\\"boom\\\"\\n\\tat Foo.bar(Foo.java:1)\""
        ));
    }

    #[test]
    fn test_colored_vs_plain_output() {
        let colored = LogfmtFormatter::new(true).format_event(&sample());
        let plain = LogfmtFormatter::new(false).format_event(&sample());
        assert!(colored.contains("\x1b[31mERROR\x1b[0m"));
        assert!(!plain.contains("\x1b["));
    }

    #[test]
    fn test_empty_value_is_quoted() {
        let formatter = LogfmtFormatter::new(false);
        assert_eq!(formatter.format_key_value_pair("message", "", ""), "message=\"\"");
        assert_eq!(formatter.format_key_value_pair("logger", "a.b", ""), "logger=a.b");
    }
}
