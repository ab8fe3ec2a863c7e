//! Tag filters deciding which scenarios a hook applies to.
//!
//! A filter is an ordered list of expressions. Each expression is a
//! comma-separated list of terms that is satisfied when any term is; a term is
//! `@tag` or its negation `~@tag`. The filter is satisfied when every
//! expression is. An empty filter applies to every scenario.

/// A parsed tag filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagFilter {
    expressions: Vec<String>,
    clauses: Vec<Vec<TagTerm>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct TagTerm {
    tag: String,
    negated: bool,
}

impl TagTerm {
    fn parse(raw: &str) -> Self {
        match raw.strip_prefix('~') {
            Some(tag) => Self {
                tag: tag.trim().to_string(),
                negated: true,
            },
            None => Self {
                tag: raw.to_string(),
                negated: false,
            },
        }
    }

    fn matches<S: AsRef<str>>(&self, tags: &[S]) -> bool {
        tags.iter().any(|tag| tag.as_ref() == self.tag) != self.negated
    }
}

impl TagFilter {
    /// Parses tag expressions, keeping their order.
    pub fn new<I, S>(expressions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let expressions: Vec<String> = expressions.into_iter().map(Into::into).collect();
        let clauses = expressions
            .iter()
            .map(|expression| {
                expression
                    .split(',')
                    .map(str::trim)
                    .filter(|term| !term.is_empty())
                    .map(TagTerm::parse)
                    .collect::<Vec<_>>()
            })
            .filter(|clause| !clause.is_empty())
            .collect();

        Self {
            expressions,
            clauses,
        }
    }

    /// Returns the raw expressions, in declaration order.
    pub fn expressions(&self) -> &[String] {
        &self.expressions
    }

    /// Returns whether the filter applies to every scenario.
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Evaluates the filter against a scenario's tags.
    pub fn matches<S: AsRef<str>>(&self, tags: &[S]) -> bool {
        self.clauses
            .iter()
            .all(|clause| clause.iter().any(|term| term.matches(tags)))
    }
}
