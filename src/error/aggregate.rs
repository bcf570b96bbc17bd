// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Collecting several [`Error`]s raised within one phase.

use derive_more::with_trait::Display;

use super::core::{Error, Result};

/// Phase of an execution in which an [`Error::Aggregate`] is raised.
///
/// Displays as the summary message of the aggregate.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum Phase {
    /// Scenario body, its hooks and world disposal.
    #[display("Multiple errors occurred during scenario execution")]
    Scenario,

    /// Disposal of world resources.
    #[display("Multiple errors occurred while disposing world resources")]
    Dispose,

    /// Tearing down a persistent scope.
    #[display("Multiple errors occurred while tearing down scope")]
    Teardown,
}

/// Accumulator of [`Error`]s raised within a single [`Phase`].
///
/// Nothing is ever dropped: a single error is returned unchanged, while
/// several ones are combined into an [`Error::Aggregate`] keeping their order.
#[derive(Clone, Debug, Default)]
pub struct Failures(Vec<Error>);

impl Failures {
    /// Creates an empty [`Failures`].
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Records the given [`Error`].
    pub fn push(&mut self, err: Error) {
        self.0.push(err);
    }

    /// Records the error of the given [`Result`], if any, returning its
    /// successful value otherwise.
    pub fn record<T>(&mut self, res: Result<T>) -> Option<T> {
        res.map_err(|e| self.push(e)).ok()
    }

    /// Indicates whether no [`Error`]s were recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of recorded [`Error`]s.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns the first recorded [`Error`].
    #[must_use]
    pub fn first(&self) -> Option<&Error> {
        self.0.first()
    }

    /// Converts recorded [`Error`]s into a [`Result`].
    ///
    /// # Errors
    ///
    /// - The recorded [`Error`] itself, if there is exactly one.
    /// - [`Error::Aggregate`] of the given [`Phase`], if there are several.
    pub fn into_result(mut self, phase: Phase) -> Result<()> {
        match self.0.len() {
            0 => Ok(()),
            1 => Err(self.0.remove(0)),
            _ => Err(Error::Aggregate { phase, causes: self.0 }),
        }
    }
}

impl Extend<Error> for Failures {
    fn extend<I: IntoIterator<Item = Error>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_errors_is_ok() {
        assert!(Failures::new().into_result(Phase::Scenario).is_ok());
    }

    #[test]
    fn single_error_is_returned_unchanged() {
        let mut failures = Failures::new();
        failures.push(Error::ExpectedFailure);

        let err = failures.into_result(Phase::Scenario).unwrap_err();
        assert!(matches!(err, Error::ExpectedFailure));
    }

    #[test]
    fn several_errors_are_aggregated_in_order() {
        let mut failures = Failures::new();
        _ = failures.record::<()>(Err(Error::ExpectedFailure));
        assert_eq!(failures.record(Ok(3)), Some(3));
        _ = failures.record::<()>(Err(Error::NoActiveScenario));

        let err = failures.into_result(Phase::Scenario).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Multiple errors occurred during scenario execution",
        );
        assert!(matches!(
            err.causes(),
            [Error::ExpectedFailure, Error::NoActiveScenario],
        ));
    }
}
