//! Token source over a fixed text

use std::collections::VecDeque;

use application::error::ApplicationError;
use application::ports::TokenSource;
use async_trait::async_trait;
use domain::TextFragment;

/// Replays a complete text as word-sized fragments
///
/// Each fragment is a word followed by the whitespace after it, so the
/// fragments concatenate back to the input exactly. Leading whitespace
/// stays attached to the first word.
#[derive(Debug, Clone)]
pub struct TextTokenSource {
    fragments: VecDeque<String>,
}

impl TextTokenSource {
    /// Split `text` at word boundaries
    pub fn new(text: &str) -> Self {
        Self {
            fragments: split_words(text),
        }
    }

    /// Number of fragments not yet handed out
    pub fn remaining(&self) -> usize {
        self.fragments.len()
    }
}

fn split_words(text: &str) -> VecDeque<String> {
    let mut fragments = VecDeque::new();
    let mut start = 0;
    let mut in_space = false;

    for (i, c) in text.char_indices() {
        if c.is_whitespace() {
            in_space = true;
        } else if in_space {
            if i > start && !text[start..i].trim().is_empty() {
                fragments.push_back(text[start..i].to_string());
                start = i;
            }
            in_space = false;
        }
    }
    if start < text.len() {
        fragments.push_back(text[start..].to_string());
    }

    fragments
}

#[async_trait]
impl TokenSource for TextTokenSource {
    async fn next_fragment(&mut self) -> Result<Option<TextFragment>, ApplicationError> {
        Ok(self.fragments.pop_front().map(TextFragment::new))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(text: &str) -> Vec<String> {
        split_words(text).into_iter().collect()
    }

    #[test]
    fn splits_after_trailing_whitespace() {
        assert_eq!(
            words("The quick  brown\tfox."),
            vec!["The ", "quick  ", "brown\t", "fox."]
        );
    }

    #[test]
    fn leading_whitespace_joins_first_word() {
        assert_eq!(words("  hi there"), vec!["  hi ", "there"]);
    }

    #[test]
    fn trailing_whitespace_is_kept() {
        assert_eq!(words("end \n"), vec!["end \n"]);
    }

    #[test]
    fn whitespace_only_text_is_one_fragment() {
        assert_eq!(words("   "), vec!["   "]);
    }

    #[test]
    fn empty_text_has_no_fragments() {
        assert!(words("").is_empty());
    }

    #[test]
    fn multibyte_text_round_trips() {
        let text = "Grüße aus Köln – schön!";
        assert_eq!(words(text).concat(), text);
    }

    #[tokio::test]
    async fn yields_fragments_then_ends() {
        let mut source = TextTokenSource::new("one two");
        assert_eq!(source.remaining(), 2);

        let first = source.next_fragment().await.unwrap().unwrap();
        assert_eq!(first.as_str(), "one ");
        let second = source.next_fragment().await.unwrap().unwrap();
        assert_eq!(second.as_str(), "two");
        assert!(source.next_fragment().await.unwrap().is_none());
        assert!(source.next_fragment().await.unwrap().is_none());
    }
}
