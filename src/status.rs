//! The single status line under the build button.

/// Narrow interface for components that report progress to the user.
pub trait ReportsStatus {
    fn set_status(&mut self, text: &str);
}

/// Shows either the live readiness headline or a message pinned by the build lifecycle.
///
/// A pinned message stays until the user edits the configuration again.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusLine {
    text: String,
    pinned: bool,
}

impl StatusLine {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_pinned(&self) -> bool {
        self.pinned
    }

    /// Live headline; ignored while a message is pinned.
    pub fn show_headline(&mut self, headline: &str) {
        if !self.pinned {
            self.text = headline.to_string();
        }
    }

    /// The configuration changed; the headline takes over again.
    pub fn release(&mut self) {
        self.pinned = false;
    }
}

impl ReportsStatus for StatusLine {
    fn set_status(&mut self, text: &str) {
        self.text = text.to_string();
        self.pinned = true;
    }
}
