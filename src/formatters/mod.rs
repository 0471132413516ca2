use crate::event::Event;

/// Trait for formatting events to single output records
pub trait EventFormatter {
    fn format_event(&self, event: &Event) -> String;
}

pub mod layout;
pub mod logfmt;
