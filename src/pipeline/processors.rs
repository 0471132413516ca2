// src/pipeline/processors.rs - Event procedures: filters and counters
use crate::event::{Event, Level};
use crate::pipeline::context::ProcessResult;
use crate::pipeline::stream::EventProcessor;
use std::collections::BTreeMap;

/// Keeps events by level.
///
/// Events without a level pass the minimum-level and exclude checks but never
/// match an include list.
pub struct LevelFilterProcessor {
    min_level: Option<Level>,
    include: Option<Vec<Level>>,
    exclude: Vec<Level>,
}

impl LevelFilterProcessor {
    pub fn new(min_level: Option<Level>, include: Option<Vec<Level>>, exclude: Vec<Level>) -> Self {
        LevelFilterProcessor {
            min_level,
            include,
            exclude,
        }
    }

    fn keeps(&self, level: Option<Level>) -> bool {
        if let Some(include) = &self.include {
            return level.is_some_and(|l| include.contains(&l));
        }
        match level {
            Some(level) => {
                !self.exclude.contains(&level) && self.min_level.map_or(true, |min| level >= min)
            }
            None => true,
        }
    }
}

impl EventProcessor for LevelFilterProcessor {
    fn process(&mut self, event: &Event) -> ProcessResult {
        if self.keeps(event.level) {
            ProcessResult::Keep
        } else {
            ProcessResult::Skip
        }
    }

    fn name(&self) -> &str {
        "level-filter"
    }
}

/// Drops events whose logger starts with any of the given prefixes
pub struct ExcludeLoggerProcessor {
    prefixes: Vec<String>,
}

impl ExcludeLoggerProcessor {
    pub fn new(prefixes: Vec<String>) -> Self {
        ExcludeLoggerProcessor { prefixes }
    }
}

impl EventProcessor for ExcludeLoggerProcessor {
    fn process(&mut self, event: &Event) -> ProcessResult {
        match &event.logger {
            Some(logger) if self.prefixes.iter().any(|p| logger.starts_with(p.as_str())) => {
                ProcessResult::Skip
            }
            _ => ProcessResult::Keep,
        }
    }

    fn name(&self) -> &str {
        "exclude-logger"
    }
}

/// Keeps events whose message or exception contains a keyword
pub struct GrepProcessor {
    keyword: String,
}

impl GrepProcessor {
    pub fn new(keyword: impl Into<String>) -> Self {
        GrepProcessor {
            keyword: keyword.into(),
        }
    }
}

impl EventProcessor for GrepProcessor {
    fn process(&mut self, event: &Event) -> ProcessResult {
        let found = [&event.message, &event.exception_rendering]
            .iter()
            .any(|text| text.as_deref().is_some_and(|t| t.contains(self.keyword.as_str())));
        if found {
            ProcessResult::Keep
        } else {
            ProcessResult::Skip
        }
    }

    fn name(&self) -> &str {
        "grep"
    }
}

/// Counts events per level instead of writing them; the counts are reported
/// by `finish`.
#[derive(Default)]
pub struct CountProcessor {
    by_level: BTreeMap<Level, usize>,
    without_level: usize,
    total: usize,
}

impl CountProcessor {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EventProcessor for CountProcessor {
    fn process(&mut self, event: &Event) -> ProcessResult {
        match event.level {
            Some(level) => *self.by_level.entry(level).or_insert(0) += 1,
            None => self.without_level += 1,
        }
        self.total += 1;
        ProcessResult::Consume
    }

    fn name(&self) -> &str {
        "count"
    }

    fn finish(&mut self) -> Vec<String> {
        let mut lines: Vec<String> = self
            .by_level
            .iter()
            .map(|(level, count)| format!("{} {}", level, count))
            .collect();
        if self.without_level > 0 {
            lines.push(format!("NONE {}", self.without_level));
        }
        lines.push(format!("total {}", self.total));
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(level: Option<Level>, logger: &str, message: &str) -> Event {
        let mut event = Event::new(1, message);
        event.level = level;
        event.logger = Some(logger.to_string());
        event.message = Some(message.to_string());
        event
    }

    #[test]
    fn test_min_level() {
        let mut filter = LevelFilterProcessor::new(Some(Level::Warn), None, Vec::new());
        assert_eq!(filter.process(&event(Some(Level::Error), "a", "x")), ProcessResult::Keep);
        assert_eq!(filter.process(&event(Some(Level::Warn), "a", "x")), ProcessResult::Keep);
        assert_eq!(filter.process(&event(Some(Level::Info), "a", "x")), ProcessResult::Skip);
        assert_eq!(filter.process(&event(None, "a", "x")), ProcessResult::Keep);
    }

    #[test]
    fn test_include_and_exclude_levels() {
        let mut include =
            LevelFilterProcessor::new(None, Some(vec![Level::Debug, Level::Fatal]), Vec::new());
        assert_eq!(include.process(&event(Some(Level::Debug), "a", "x")), ProcessResult::Keep);
        assert_eq!(include.process(&event(Some(Level::Error), "a", "x")), ProcessResult::Skip);
        assert_eq!(include.process(&event(None, "a", "x")), ProcessResult::Skip);

        let mut exclude = LevelFilterProcessor::new(None, None, vec![Level::Trace]);
        assert_eq!(exclude.process(&event(Some(Level::Trace), "a", "x")), ProcessResult::Skip);
        assert_eq!(exclude.process(&event(Some(Level::Info), "a", "x")), ProcessResult::Keep);
    }

    #[test]
    fn test_exclude_logger_prefix() {
        let mut filter = ExcludeLoggerProcessor::new(vec!["org.jboss".to_string()]);
        assert_eq!(filter.process(&event(None, "org.jboss.as.server", "x")), ProcessResult::Skip);
        assert_eq!(filter.process(&event(None, "org.acme", "x")), ProcessResult::Keep);
        assert_eq!(filter.process(&Event::new(1, "no logger")), ProcessResult::Keep);
    }

    #[test]
    fn test_grep_searches_message_and_exception() {
        let mut grep = GrepProcessor::new("timeout");
        assert_eq!(grep.process(&event(None, "a", "connect timeout")), ProcessResult::Keep);
        assert_eq!(grep.process(&event(None, "a", "all good")), ProcessResult::Skip);

        let mut failed = event(None, "a", "failed");
        failed.exception_rendering = Some("java.net.SocketTimeoutException: read timeout".to_string());
        assert_eq!(grep.process(&failed), ProcessResult::Keep);
    }

    #[test]
    fn test_count_summary() {
        let mut count = CountProcessor::new();
        count.process(&event(Some(Level::Info), "a", "x"));
        count.process(&event(Some(Level::Info), "a", "x"));
        count.process(&event(Some(Level::Error), "a", "x"));
        count.process(&event(None, "a", "x"));
        assert_eq!(count.finish(), vec!["INFO 2", "ERROR 1", "NONE 1", "total 4"]);

        assert_eq!(CountProcessor::new().finish(), vec!["total 0"]);
    }
}
