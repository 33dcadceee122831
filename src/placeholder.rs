//! Placeholder shown when the logical collection is empty.

/// Default hint, matching the table's Ctrl-Insert binding.
pub const DEFAULT_INSERT_HINT: &str = "Press <Ctrl-INSERT> to insert new data.";

/// Stand-in for the row area while the collection has no records. Displays
/// a configurable hint and can hold focus so keyboard insert still works.
#[derive(Debug, Clone)]
pub struct EmptyStatePlaceholder {
    message: String,
    visible: bool,
    focused: bool,
}

impl EmptyStatePlaceholder {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            visible: false,
            focused: false,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn set_message(&mut self, message: impl Into<String>) {
        self.message = message.into();
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn show(&mut self) {
        self.visible = true;
    }

    pub fn hide(&mut self) {
        self.visible = false;
        self.focused = false;
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn set_focus(&mut self, focused: bool) {
        self.focused = focused && self.visible;
    }
}

impl Default for EmptyStatePlaceholder {
    fn default() -> Self {
        Self::new(DEFAULT_INSERT_HINT)
    }
}
