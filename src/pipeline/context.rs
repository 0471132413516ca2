use std::time::Duration;

/// Verdict of one procedure on one event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessResult {
    /// Pass the event on to the next procedure
    Keep,
    /// Filter the event out
    Skip,
    /// The procedure took the event over; nothing is written for it
    Consume,
}

/// Runtime statistics
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ProcessingStats {
    pub lines_read: usize,
    pub events_parsed: usize,
    pub events_written: usize,
    pub events_filtered: usize,
    /// Continuation lines with no event to attach to, and overlong lines
    pub lines_skipped: usize,
    pub fatal_errors: usize,
    pub processing_time: Duration,
}

impl ProcessingStats {
    /// Add the counters of one stream to the running totals
    pub fn absorb(&mut self, other: &ProcessingStats) {
        self.lines_read += other.lines_read;
        self.events_parsed += other.events_parsed;
        self.events_written += other.events_written;
        self.events_filtered += other.events_filtered;
        self.lines_skipped += other.lines_skipped;
        self.fatal_errors += other.fatal_errors;
        self.processing_time += other.processing_time;
    }

    /// Lines per second, if any time was spent
    pub fn rate(&self) -> Option<f64> {
        let secs = self.processing_time.as_secs_f64();
        if self.lines_read == 0 || secs == 0.0 {
            None
        } else {
            Some(self.lines_read as f64 / secs)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absorb() {
        let mut total = ProcessingStats::default();
        let file = ProcessingStats {
            lines_read: 10,
            events_parsed: 4,
            events_written: 3,
            events_filtered: 1,
            lines_skipped: 2,
            fatal_errors: 0,
            processing_time: Duration::from_millis(5),
        };
        total.absorb(&file);
        total.absorb(&file);
        assert_eq!(total.lines_read, 20);
        assert_eq!(total.events_written, 6);
        assert_eq!(total.processing_time, Duration::from_millis(10));
        assert!(total.rate().is_some());
        assert_eq!(ProcessingStats::default().rate(), None);
    }
}
