//! Turn-scoped interpreter output.
//!
//! A [`Transcript`] holds exactly the text one `start` or `submit` call
//! produced. Line endings are normalized to `\n` on construction.

use std::fmt;

use serde::Serialize;

/// The prompt character interpreters print when they want input.
pub const PROMPT: char = '>';

/// Output produced by a single turn.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Transcript(String);

impl Transcript {
    /// Wrap raw interpreter output, normalizing line endings.
    pub fn new(text: impl AsRef<str>) -> Self {
        Self(normalize_newlines(text.as_ref()))
    }

    /// The transcript text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Take the text out.
    pub fn into_string(self) -> String {
        self.0
    }

    /// Whether the turn printed nothing.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether the text ends with the input prompt, ignoring trailing
    /// whitespace.
    pub fn ends_with_prompt(&self) -> bool {
        ends_with_prompt(&self.0)
    }

    /// Drop the first line when it repeats `command`, as interpreters that
    /// echo their input do.
    pub fn strip_echo(self, command: &str) -> Self {
        let command = command.trim();
        let (first, rest) = match self.0.split_once('\n') {
            Some((first, rest)) => (first, rest),
            None => (self.0.as_str(), ""),
        };
        if !command.is_empty() && first.trim().trim_start_matches(PROMPT).trim() == command {
            Self(rest.to_string())
        } else {
            self
        }
    }
}

impl fmt::Display for Transcript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Transcript {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}

impl From<Transcript> for String {
    fn from(transcript: Transcript) -> Self {
        transcript.0
    }
}

/// Replace `\r\n` and lone `\r` with `\n`.
pub fn normalize_newlines(text: &str) -> String {
    if !text.contains('\r') {
        return text.to_string();
    }
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// Whether `text` ends with [`PROMPT`], ignoring trailing whitespace.
pub fn ends_with_prompt(text: &str) -> bool {
    text.trim_end().ends_with(PROMPT)
}
