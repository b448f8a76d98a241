//! Prohibited-word redaction for generated text.
//!
//! The word list is plain text, one word per line, loaded once at startup
//! and immutable afterwards.  A missing or empty list disables redaction.

use crate::log_internal;
use regex::Regex;
use std::path::Path;

const REDACTION_MARKER: &str = "####";

pub struct WordFilter {
    pattern: Option<Regex>,
}

impl WordFilter {
    /// Load the word list.  Never fails; an unreadable file just yields a
    /// no-op filter.
    pub async fn load(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::from_words::<&str>(&[]);
        };

        match tokio::fs::read_to_string(path).await {
            Ok(contents) => {
                let words: Vec<&str> = contents
                    .lines()
                    .map(str::trim)
                    .filter(|line| !line.is_empty())
                    .collect();
                log_internal!(
                    "Loaded {} prohibited word(s) from `{}`",
                    words.len(),
                    path.to_string_lossy()
                );
                Self::from_words(&words)
            }
            Err(e) => {
                log_internal!(
                    "Could not read word list `{}`: {}; redaction disabled",
                    path.to_string_lossy(),
                    e
                );
                Self::from_words::<&str>(&[])
            }
        }
    }

    pub fn from_words<S: AsRef<str>>(words: &[S]) -> Self {
        let words: Vec<&str> = words
            .iter()
            .map(|w| w.as_ref())
            .filter(|w| !w.is_empty())
            .collect();

        if words.is_empty() {
            return Self { pattern: None };
        }

        // Escape each word and compile one alternation.  Escaped literals
        // can't produce an invalid pattern.
        let alternation = words
            .iter()
            .map(|w| regex::escape(w))
            .collect::<Vec<_>>()
            .join("|");

        Self {
            pattern: Regex::new(&alternation).ok(),
        }
    }

    /// Replace every occurrence of a listed word with the redaction marker.
    /// Identity when no list is loaded.
    pub fn redact<'a>(&self, text: &'a str) -> std::borrow::Cow<'a, str> {
        match &self.pattern {
            Some(pattern) => pattern.replace_all(text, REDACTION_MARKER),
            None => std::borrow::Cow::Borrowed(text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redacts_listed_words() {
        let filter = WordFilter::from_words(&["heck", "darn"]);
        assert_eq!(
            filter.redact("what the heck, darn it"),
            "what the ####, #### it"
        );
    }

    #[test]
    fn empty_list_is_identity() {
        let filter = WordFilter::from_words::<&str>(&[]);
        assert_eq!(filter.redact("anything at all"), "anything at all");
    }

    #[test]
    fn redaction_is_idempotent() {
        let filter = WordFilter::from_words(&["heck"]);
        let once = filter.redact("oh heck").into_owned();
        let twice = filter.redact(&once).into_owned();
        assert_eq!(once, twice);
    }

    #[test]
    fn words_are_matched_literally() {
        // Regex metacharacters in the list must not change the match
        let filter = WordFilter::from_words(&["a.b"]);
        assert_eq!(filter.redact("a.b acb"), "#### acb");
    }

    #[test]
    fn matching_is_case_sensitive() {
        let filter = WordFilter::from_words(&["heck"]);
        assert_eq!(filter.redact("Heck no, heck yes"), "Heck no, #### yes");
    }
}
