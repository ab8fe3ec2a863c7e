//! Pattern compiler.
//!
//! Match text is regular-expression syntax. A pattern matches step text when a
//! match starts at the beginning of the text; authors anchor the end with `$`
//! when they need a full match. Advice patterns always match the whole text
//! (see [`CompiledPattern::whole_captures`]).

use regex::{Captures, Match, Regex};

use crate::error::PatternError;
use crate::handler::Argument;

/// An immutable compiled matcher.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    source: String,
    regex: Regex,
    whole: Regex,
}

impl CompiledPattern {
    /// Compiles raw match text.
    pub fn compile(raw: &str) -> Result<Self, PatternError> {
        let syntax = |source| PatternError::Syntax {
            pattern: raw.to_string(),
            source,
        };
        let regex = Regex::new(raw).map_err(syntax)?;
        let whole = Regex::new(&format!(r"\A(?:{raw})\z")).map_err(syntax)?;
        Ok(Self {
            source: raw.to_string(),
            regex,
            whole,
        })
    }

    /// Returns the raw match text.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns the number of capture groups, not counting the implicit whole-match group.
    pub fn group_count(&self) -> usize {
        self.regex.captures_len() - 1
    }

    /// Returns whether the pattern matches `text`.
    pub fn is_match(&self, text: &str) -> bool {
        self.captures(text).is_some()
    }

    /// Returns the captures of a match starting at the beginning of `text`.
    pub fn captures<'t>(&self, text: &'t str) -> Option<Captures<'t>> {
        // Leftmost-first: if any match starts at 0, it is the one reported.
        self.regex
            .captures(text)
            .filter(|caps| caps.get(0).is_some_and(|m| m.start() == 0))
    }

    /// Returns the captures of a match spanning all of `text`.
    ///
    /// Group numbering is the same as for [`captures`](Self::captures).
    pub fn whole_captures<'t>(&self, text: &'t str) -> Option<Captures<'t>> {
        self.whole.captures(text)
    }

    /// Returns the arguments captured from `text`, or `None` if it does not match.
    pub fn match_arguments(&self, text: &str) -> Option<Vec<Argument>> {
        let caps = self.captures(text)?;
        Some(arguments(&caps, 1))
    }
}

/// Converts capture groups starting at `first` into arguments.
pub(crate) fn arguments(caps: &Captures<'_>, first: usize) -> Vec<Argument> {
    caps.iter().skip(first).map(argument).collect()
}

fn argument(group: Option<Match<'_>>) -> Argument {
    match group {
        Some(m) => Argument::new(Some(m.start()), Some(m.as_str().to_string())),
        None => Argument::new(None, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_invalid_pattern() {
        let err = CompiledPattern::compile("^I have (\\d+ cukes$").unwrap_err();
        assert!(matches!(err, PatternError::Syntax { ref pattern, .. } if pattern == "^I have (\\d+ cukes$"));
    }

    #[test]
    fn test_compile_is_deterministic() {
        let a = CompiledPattern::compile(r"^I have (\d+) (cukes|apples)$").unwrap();
        let b = CompiledPattern::compile(r"^I have (\d+) (cukes|apples)$").unwrap();

        for text in ["I have 5 cukes", "I have 12 apples", "I have cukes", "", "I have 5 pears"] {
            assert_eq!(a.match_arguments(text), b.match_arguments(text));
        }
    }

    #[test]
    fn test_match_arguments() {
        let pattern = CompiledPattern::compile(r"^I have (\d+) cukes(?: in my (\w+))?$").unwrap();
        assert_eq!(pattern.group_count(), 2);

        let args = pattern.match_arguments("I have 42 cukes").unwrap();
        assert_eq!(args[0], Argument::new(Some(7), Some("42".to_string())));
        assert_eq!(args[1], Argument::new(None, None));

        let args = pattern.match_arguments("I have 1 cukes in my belly").unwrap();
        assert_eq!(args[1].value(), Some("belly"));
    }

    #[test]
    fn test_match_must_start_at_beginning() {
        let pattern = CompiledPattern::compile("cukes").unwrap();
        assert!(pattern.is_match("cukes in the belly"));
        assert!(!pattern.is_match("I have cukes"));
    }

    #[test]
    fn test_whole_captures_span_the_text() {
        let pattern = CompiledPattern::compile(r"^(.*) slowly|(.*) quickly").unwrap();
        assert_eq!(pattern.group_count(), 2);

        assert!(pattern.captures("one slowly and then some").is_some());
        assert!(pattern.whole_captures("one slowly and then some").is_none());

        let caps = pattern.whole_captures("two quickly").unwrap();
        assert!(caps.get(1).is_none());
        assert_eq!(caps.get(2).map(|m| m.as_str()), Some("two"));
    }
}
