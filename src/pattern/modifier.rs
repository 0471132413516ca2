// src/pattern/modifier.rs - Width, justification and truncation of one field

use crate::error::CompileError;
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

/// Format modifier of a conversion specifier, e.g. the `-5` in `%-5p`
/// or the `.30` in `%.30c`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatModifier {
    pub min_width: Option<usize>,
    pub right_justified: bool,
    pub max_width: Option<usize>,
    pub truncate_from_front: bool,
}

impl Default for FormatModifier {
    fn default() -> Self {
        FormatModifier {
            min_width: None,
            right_justified: true,
            max_width: None,
            truncate_from_front: true,
        }
    }
}

impl FormatModifier {
    /// Parse a modifier literal of shape `[-]<min>[.[-]<max>]`
    pub fn parse(literal: &str) -> Result<Self, CompileError> {
        let invalid = |reason: &str| CompileError::InvalidModifier {
            literal: literal.to_string(),
            reason: reason.to_string(),
        };

        if literal.is_empty() {
            return Err(invalid("empty modifier"));
        }

        let (min_part, max_part) = match literal.split_once('.') {
            Some((min, max)) => (min, Some(max)),
            None => (literal, None),
        };

        let mut modifier = FormatModifier::default();

        if !min_part.is_empty() {
            let digits = match min_part.strip_prefix('-') {
                Some(rest) => {
                    modifier.right_justified = false;
                    rest
                }
                None => min_part,
            };
            modifier.min_width = Some(parse_width(digits).map_err(|r| invalid(&r))?);
        }

        if let Some(max_part) = max_part {
            let digits = match max_part.strip_prefix('-') {
                Some(rest) => {
                    modifier.truncate_from_front = false;
                    rest
                }
                None => max_part,
            };
            let max = parse_width(digits).map_err(|r| invalid(&r))?;
            if max == 0 {
                return Err(invalid("maximum width must be positive"));
            }
            modifier.max_width = Some(max);
        }

        Ok(modifier)
    }

    /// Pad or truncate `value` the way the logging framework renders it
    pub fn apply<'a>(&self, value: &'a str) -> Cow<'a, str> {
        let len = value.chars().count();

        if let Some(max) = self.max_width {
            if len > max {
                let kept: String = if self.truncate_from_front {
                    value.chars().skip(len - max).collect()
                } else {
                    value.chars().take(max).collect()
                };
                return Cow::Owned(kept);
            }
        }

        match self.min_width {
            Some(min) if len < min => {
                let padding = " ".repeat(min - len);
                let padded = if self.right_justified {
                    format!("{}{}", padding, value)
                } else {
                    format!("{}{}", value, padding)
                };
                Cow::Owned(padded)
            }
            _ => Cow::Borrowed(value),
        }
    }

    /// Strip the padding `apply` may have added to a matched field.
    ///
    /// Only fields no longer than the minimum width can carry padding, and only
    /// on the justified side. A value that was truncated by the maximum width
    /// is returned as it appears; the dropped characters cannot be recovered.
    pub fn unapply<'a>(&self, field: &'a str) -> &'a str {
        let min = match self.min_width {
            Some(min) => min,
            None => return field,
        };
        if field.chars().count() > min {
            return field;
        }
        if self.right_justified {
            field.trim_start_matches(' ')
        } else {
            field.trim_end_matches(' ')
        }
    }

    /// Width of the rendered field when it can only ever be one size
    pub fn fixed_width(&self) -> Option<usize> {
        match (self.min_width, self.max_width) {
            (Some(min), Some(max)) if min == max => Some(min),
            _ => None,
        }
    }

    /// True when `field` could not have been produced by `apply`
    pub fn exceeds_max(&self, field: &str) -> bool {
        self.max_width
            .is_some_and(|max| field.chars().count() > max)
    }
}

fn parse_width(digits: &str) -> Result<usize, String> {
    if digits.is_empty() {
        return Err("missing width".to_string());
    }
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(format!("'{}' is not a number", digits));
    }
    digits
        .parse::<usize>()
        .map_err(|e| format!("'{}': {}", digits, e))
}

impl FromStr for FormatModifier {
    type Err = CompileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FormatModifier::parse(s)
    }
}

impl fmt::Display for FormatModifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(min) = self.min_width {
            if !self.right_justified {
                f.write_str("-")?;
            }
            write!(f, "{}", min)?;
        }
        if let Some(max) = self.max_width {
            f.write_str(".")?;
            if !self.truncate_from_front {
                f.write_str("-")?;
            }
            write!(f, "{}", max)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn modifier(literal: &str) -> FormatModifier {
        FormatModifier::parse(literal).unwrap()
    }

    #[test]
    fn test_pad_right_justified() {
        assert_eq!(modifier("5").apply(""), "     ");
        assert_eq!(modifier("5").apply("ab"), "   ab");
    }

    #[test]
    fn test_pad_left_justified() {
        assert_eq!(modifier("-5").apply("a"), "a    ");
    }

    #[test]
    fn test_truncate_from_front() {
        assert_eq!(modifier(".3").apply("ABCD"), "BCD");
    }

    #[test]
    fn test_truncate_from_end_with_left_justified_min() {
        let m = modifier("-2.-3");
        assert_eq!(m.min_width, Some(2));
        assert!(!m.right_justified);
        assert_eq!(m.max_width, Some(3));
        assert!(!m.truncate_from_front);
        assert_eq!(m.apply("ABCD"), "ABC");
        assert_eq!(m.apply("A"), "A ");
    }

    #[test]
    fn test_long_values_are_untouched_without_max() {
        assert_eq!(modifier("3").apply("ABCDE"), "ABCDE");
    }

    #[test]
    fn test_unapply_strips_padding_side_only() {
        assert_eq!(modifier("-5").unapply("INFO "), "INFO");
        assert_eq!(modifier("5").unapply(" INFO"), "INFO");
        // trailing spaces of a right-justified field belong to the value
        assert_eq!(modifier("5").unapply("ab   "), "ab   ");
        // longer than the minimum width: nothing was padded
        assert_eq!(modifier("-2").unapply("abc  "), "abc  ");
    }

    #[test]
    fn test_unapply_after_truncation_is_lossy() {
        let m = modifier(".3");
        let rendered = m.apply("ABCD");
        assert_eq!(m.unapply(&rendered), "BCD");
        assert!(!m.exceeds_max(&rendered));
        assert!(m.exceeds_max("ABCD"));
    }

    #[test]
    fn test_parse_errors() {
        assert!(FormatModifier::parse("x").is_err());
        assert!(FormatModifier::parse("5.").is_err());
        assert!(FormatModifier::parse("-").is_err());
        assert!(FormatModifier::parse("1.0").is_err());
        assert!(FormatModifier::parse("").is_err());
    }

    #[test]
    fn test_display_round_trips_literal() {
        for literal in ["5", "-5", ".30", "-20.-30", "10.2"] {
            assert_eq!(modifier(literal).to_string(), literal);
        }
        assert_eq!(modifier("-5").fixed_width(), None);
        assert_eq!(modifier("4.4").fixed_width(), Some(4));
    }
}
