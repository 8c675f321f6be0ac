use regex::{Regex, RegexBuilder};
use scraper::Selector;
use tracing::warn;

/// One query expression of a [`SelectorSpec`].
#[derive(Debug, Clone)]
pub enum SelectorExpr {
    /// CSS query; the first matching element wins.
    Structural(Selector),
    /// Case-insensitive match against visible text; the enclosing element wins.
    Contains(Regex),
}

impl SelectorExpr {
    pub fn css(query: &str) -> Result<Self, SelectorError> {
        Selector::parse(query)
            .map(Self::Structural)
            .map_err(|e| SelectorError::Css {
                query: query.to_string(),
                reason: e.to_string(),
            })
    }

    /// Literal substring, matched case-insensitively.
    pub fn contains(text: &str) -> Result<Self, SelectorError> {
        Self::contains_pattern(&regex::escape(text))
    }

    /// Regular expression, matched case-insensitively.
    pub fn contains_pattern(pattern: &str) -> Result<Self, SelectorError> {
        RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map(Self::Contains)
            .map_err(|e| SelectorError::Pattern {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SelectorError {
    #[error("invalid css query {query:?}: {reason}")]
    Css { query: String, reason: String },

    #[error("invalid text pattern {pattern:?}: {reason}")]
    Pattern { pattern: String, reason: String },
}

/// Ordered query expressions for one field.
#[derive(Debug, Clone, Default)]
pub struct SelectorSpec {
    exprs: Vec<SelectorExpr>,
}

impl SelectorSpec {
    pub fn builder() -> SelectorSpecBuilder {
        SelectorSpecBuilder::default()
    }

    pub fn exprs(&self) -> &[SelectorExpr] {
        &self.exprs
    }

    pub fn len(&self) -> usize {
        self.exprs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exprs.is_empty()
    }
}

impl From<Vec<SelectorExpr>> for SelectorSpec {
    fn from(exprs: Vec<SelectorExpr>) -> Self {
        Self { exprs }
    }
}

/// Collects expressions in priority order. Invalid expressions are logged and
/// left out so one broken query cannot take down a whole profile.
#[derive(Debug, Default)]
pub struct SelectorSpecBuilder {
    exprs: Vec<SelectorExpr>,
}

impl SelectorSpecBuilder {
    pub fn css(self, query: &str) -> Self {
        self.push(SelectorExpr::css(query))
    }

    pub fn contains(self, text: &str) -> Self {
        self.push(SelectorExpr::contains(text))
    }

    pub fn contains_pattern(self, pattern: &str) -> Self {
        self.push(SelectorExpr::contains_pattern(pattern))
    }

    pub fn build(self) -> SelectorSpec {
        SelectorSpec { exprs: self.exprs }
    }

    fn push(mut self, expr: Result<SelectorExpr, SelectorError>) -> Self {
        match expr {
            Ok(expr) => self.exprs.push(expr),
            Err(e) => warn!("dropping selector expression: {}", e),
        }
        self
    }
}

/// Shorthand for a spec made only of CSS queries.
pub fn css_spec(queries: &[&str]) -> SelectorSpec {
    queries
        .iter()
        .fold(SelectorSpec::builder(), |builder, query| builder.css(query))
        .build()
}
