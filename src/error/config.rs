// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Configuration and validation errors.

use derive_more::with_trait::{Display, Error};

/// Errors of parsing and validating engine configuration.
#[derive(Clone, Debug, Display, Eq, Error, PartialEq)]
pub enum ConfigError {
    /// Tag expression cannot be parsed.
    #[display("invalid tag expression `{expression}`: {reason}")]
    TagExpression {
        /// Tag expression itself.
        expression: String,

        /// Reason of the failure.
        reason: String,
    },

    /// Timeout cannot be parsed.
    #[display("invalid timeout `{input}`: {reason}")]
    Timeout {
        /// Timeout as specified.
        input: String,

        /// Reason of the failure.
        reason: String,
    },
}

impl ConfigError {
    /// Creates a new [`ConfigError::TagExpression`].
    #[must_use]
    pub fn tag_expression(
        expression: impl Into<String>,
        reason: impl ToString,
    ) -> Self {
        Self::TagExpression {
            expression: expression.into(),
            reason: reason.to_string(),
        }
    }

    /// Creates a new [`ConfigError::Timeout`].
    #[must_use]
    pub fn timeout(input: impl Into<String>, reason: impl ToString) -> Self {
        Self::Timeout { input: input.into(), reason: reason.to_string() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_reason() {
        let err = ConfigError::tag_expression("@a and", "unexpected end");
        assert_eq!(
            err.to_string(),
            "invalid tag expression `@a and`: unexpected end",
        );

        let err = ConfigError::timeout("soon", "unknown unit");
        assert_eq!(err.to_string(), "invalid timeout `soon`: unknown unit");
    }
}
