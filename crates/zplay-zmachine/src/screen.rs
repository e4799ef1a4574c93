//! Output sink abstraction.

/// Receives text printed by the story to the lower window.
pub trait Screen {
    /// Append printed text.
    fn print(&mut self, text: &str);
}

impl Screen for String {
    fn print(&mut self, text: &str) {
        self.push_str(text);
    }
}
