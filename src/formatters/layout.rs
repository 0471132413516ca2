use crate::event::Event;
use crate::formatters::EventFormatter;
use crate::pattern::PatternLayout;

/// Renders events back into log text through a conversion pattern
pub struct LayoutFormatter {
    layout: PatternLayout,
}

impl LayoutFormatter {
    pub fn new(layout: PatternLayout) -> Self {
        LayoutFormatter { layout }
    }
}

impl EventFormatter for LayoutFormatter {
    /// The rendered text without the final line separator; the writer adds it
    fn format_event(&self, event: &Event) -> String {
        let mut rendered = self.layout.format(event);
        if rendered.ends_with('\n') {
            rendered.pop();
        }
        rendered
    }
}
