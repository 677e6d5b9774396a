//! Text fragment value object

use std::fmt;

/// One incremental piece of text from the upstream token stream
///
/// Fragments are immutable and carry no identity; only their order matters.
/// An empty fragment is legal and contributes nothing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TextFragment(String);

impl TextFragment {
    /// Create a fragment
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// Get the fragment text
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Length in UTF-8 code units
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the fragment carries no text
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Consume and return the text
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for TextFragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TextFragment {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for TextFragment {
    fn from(text: String) -> Self {
        Self(text)
    }
}

impl AsRef<str> for TextFragment {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
