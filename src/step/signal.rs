// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Non-successful outcomes of a step handler.

use std::error::Error as StdError;

use derive_more::with_trait::Display;

use crate::error::BoxError;

/// Result of a step handler.
pub type Result = std::result::Result<(), Signal>;

/// Marker of a step (and so its scenario) not being implemented yet.
///
/// Returning it halts the remaining steps of the scenario without failing it.
#[derive(Clone, Debug, Default, Display, Eq, PartialEq)]
#[display("{}", reason.as_deref().unwrap_or("pending"))]
pub struct Pending {
    reason: Option<String>,
}

impl Pending {
    /// Creates a new [`Pending`] marker without a reason.
    #[must_use]
    pub const fn new() -> Self {
        Self { reason: None }
    }

    /// Creates a new [`Pending`] marker with the given `reason`.
    ///
    /// The `reason` is trimmed, and a blank one is omitted.
    #[must_use]
    pub fn because(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        let trimmed = reason.trim();
        Self { reason: (!trimmed.is_empty()).then(|| trimmed.to_owned()) }
    }

    /// Returns the reason of this [`Pending`] marker, if any.
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    /// Converts this [`Pending`] marker into its reason.
    #[must_use]
    pub fn into_reason(self) -> Option<String> {
        self.reason
    }
}

/// Signal returned by a step handler instead of a success.
///
/// Any [`std::error::Error`] converts into [`Signal::Failed`], so `?` works
/// naturally inside step handlers.
#[derive(Debug, Display)]
pub enum Signal {
    /// Step is not implemented yet.
    #[display("{_0}")]
    Pending(Pending),

    /// Step has failed.
    #[display("{_0}")]
    Failed(BoxError),
}

impl Signal {
    /// Creates a new [`Signal::Failed`] out of anything convertible into a
    /// [`BoxError`], including plain strings.
    #[must_use]
    pub fn failed(err: impl Into<BoxError>) -> Self {
        Self::Failed(err.into())
    }

    /// Indicates whether this is a [`Signal::Pending`].
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::Pending(_))
    }
}

impl From<Pending> for Signal {
    fn from(p: Pending) -> Self {
        Self::Pending(p)
    }
}

impl<E: StdError + Send + Sync + 'static> From<E> for Signal {
    fn from(err: E) -> Self {
        Self::Failed(Box::new(err))
    }
}

/// Creates a [`Signal::Pending`] with the given `reason`.
///
/// ```rust
/// # use cucumber_scopes::step;
/// fn later() -> step::Result {
///     Err(step::pending("needs work"))
/// }
/// ```
#[must_use]
pub fn pending(reason: impl Into<String>) -> Signal {
    Signal::Pending(Pending::because(reason))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fails() -> Result {
        let n: u8 = "x".parse()?;
        assert_eq!(n, 0, "unreachable");
        Ok(())
    }

    #[test]
    fn trims_reason() {
        assert_eq!(Pending::because("  needs work \n").reason(), Some("needs work"));
        assert_eq!(Pending::because("   ").reason(), None);
        assert_eq!(Pending::new().to_string(), "pending");
    }

    #[test]
    fn question_mark_fails() {
        let err = fails().unwrap_err();

        assert!(!err.is_pending());
        assert_eq!(err.to_string(), "invalid digit found in string");
    }

    #[test]
    fn pending_helper() {
        let signal = pending("later");

        assert!(signal.is_pending());
        assert_eq!(signal.to_string(), "later");
        assert_eq!(Signal::failed("oops").to_string(), "oops");
    }
}
