// Copyright (c) 2018-2023  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! [`TagFilter`] selecting scenarios by a boolean tag expression.

use std::str::FromStr;

use gherkin::tagexpr::TagOperation;
use sealed::sealed;

use crate::error::ConfigError;

/// Strips the leading `@` of a tag, if any.
#[must_use]
pub fn normalize(tag: &str) -> &str {
    tag.strip_prefix('@').unwrap_or(tag)
}

/// Extension of a [`TagOperation`] allowing to evaluate it.
#[sealed]
pub trait Ext {
    /// Evaluates this [`TagOperation`] for the given `tags`.
    ///
    /// Tags are compared regardless of their leading `@`.
    #[must_use]
    fn eval<I, S>(&self, tags: I) -> bool
    where
        S: AsRef<str>,
        I: IntoIterator<Item = S> + Clone;
}

#[sealed]
impl Ext for TagOperation {
    fn eval<I, S>(&self, tags: I) -> bool
    where
        S: AsRef<str>,
        I: IntoIterator<Item = S> + Clone,
    {
        match self {
            Self::And(l, r) => l.eval(tags.clone()) & r.eval(tags),
            Self::Or(l, r) => l.eval(tags.clone()) | r.eval(tags),
            Self::Not(t) => !t.eval(tags),
            Self::Tag(t) => tags
                .into_iter()
                .any(|tag| normalize(tag.as_ref()) == normalize(t)),
        }
    }
}

/// Compiled boolean tag expression.
///
/// Supports `and`, `or`, `not` and parentheses over tag literals. A
/// [`TagFilter`] without an expression accepts everything.
#[derive(Clone, Debug, Default)]
pub struct TagFilter {
    /// Source text and the compiled [`TagOperation`].
    compiled: Option<(String, TagOperation)>,
}

impl TagFilter {
    /// Compiles the given tag `expression`.
    ///
    /// A blank `expression` results in a [`TagFilter`] accepting everything.
    ///
    /// # Errors
    ///
    /// [`ConfigError::TagExpression`] if the `expression` cannot be parsed.
    pub fn new(expression: &str) -> Result<Self, ConfigError> {
        let trimmed = expression.trim();
        if trimmed.is_empty() {
            return Ok(Self::default());
        }

        let op = trimmed
            .parse::<TagOperation>()
            .map_err(|e| ConfigError::tag_expression(trimmed, e))?;
        Ok(Self { compiled: Some((trimmed.to_owned(), op)) })
    }

    /// Returns the source text of the expression, if any.
    #[must_use]
    pub fn expression(&self) -> Option<&str> {
        self.compiled.as_ref().map(|(src, _)| src.as_str())
    }

    /// Evaluates the expression against the given `tags`.
    #[must_use]
    pub fn evaluate<I, S>(&self, tags: I) -> bool
    where
        S: AsRef<str>,
        I: IntoIterator<Item = S> + Clone,
    {
        self.compiled.as_ref().map_or(true, |(_, op)| op.eval(tags))
    }
}

impl FromStr for TagFilter {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Compiles the given tag `expression` into a [`TagFilter`].
///
/// # Errors
///
/// [`ConfigError::TagExpression`] if the `expression` cannot be parsed.
pub fn tag_filter(expression: &str) -> Result<TagFilter, ConfigError> {
    TagFilter::new(expression)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn and_not() {
        let filter = tag_filter("@smoke and not @slow").unwrap();

        assert!(filter.evaluate(["@smoke", "@fast"]));
        assert!(!filter.evaluate(["@smoke", "@slow"]));
        assert!(!filter.evaluate(["@fast"]));
    }

    #[test]
    fn or_with_parentheses() {
        let filter = tag_filter("(@a or @b) and not @c").unwrap();

        assert!(filter.evaluate(["@a"]));
        assert!(filter.evaluate(["@b", "@d"]));
        assert!(!filter.evaluate(["@b", "@c"]));
        assert!(!filter.evaluate(Vec::<String>::new()));
    }

    #[test]
    fn ignores_leading_at() {
        let filter = tag_filter("@smoke").unwrap();

        assert!(filter.evaluate(["smoke"]));
        assert!(filter.evaluate(["@smoke"]));
    }

    #[test]
    fn empty_expression_accepts_everything() {
        let filter = tag_filter("   ").unwrap();

        assert!(filter.expression().is_none());
        assert!(filter.evaluate(Vec::<String>::new()));
        assert!(TagFilter::default().evaluate(["@anything"]));
    }

    #[test]
    fn invalid_expression() {
        assert!(matches!(
            tag_filter("(@a or"),
            Err(ConfigError::TagExpression { .. }),
        ));
    }
}
