// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Core [`Error`] type of the engine.
//!
//! Every failure raised while running hooks, steps, world factories or
//! disposers ends up as an [`Error`]. It's cheap to [`Clone`], so the same
//! failure can be recorded on a [`ScenarioExecution`] and returned to the host
//! runtime at once.
//!
//! [`ScenarioExecution`]: crate::ScenarioExecution

use std::{
    any::Any,
    error::Error as StdError,
    sync::{Arc, Mutex},
};

use super::{aggregate::Phase, config::ConfigError, table::TableError};
use crate::scope::{ScopeId, ScopeKind};

/// Boxed error returned by user-provided handlers.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Result type alias using [`Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Top-level error of the scenario execution engine.
#[derive(Clone, Debug, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum Error {
    /// Error returned by a step, hook, disposer or world factory.
    #[display("{_0}")]
    Handler(#[error(source)] Arc<dyn StdError + Send + Sync + 'static>),

    /// Handler panicked.
    ///
    /// The original panic payload is preserved, so a non-[`Error`] value
    /// raised by a handler is never lost.
    #[display("{message}")]
    Panicked {
        /// Message extracted from the panic payload.
        #[error(not(source))]
        message: String,

        /// Original panic payload.
        #[error(not(source))]
        payload: Arc<Mutex<Box<dyn Any + Send + 'static>>>,
    },

    /// More than one error was raised within the same [`Phase`].
    #[display("{phase}")]
    Aggregate {
        /// [`Phase`] the errors were raised in.
        #[error(not(source))]
        phase: Phase,

        /// Original errors, in the order they were raised.
        #[error(not(source))]
        causes: Vec<Error>,
    },

    /// Scenario registered as expected to fail has completed successfully.
    #[display("expected scenario to fail")]
    ExpectedFailure,

    /// Current world was requested outside of a running scenario.
    #[display("no scenario is running in the current task")]
    NoActiveScenario,

    /// Current world is of another type than the requested one.
    #[display("current world is not a `{expected}`")]
    WorldMismatch {
        /// Name of the requested world type.
        #[error(not(source))]
        expected: &'static str,
    },

    /// Scope is not a part of the plan.
    #[display("unknown scope `{_0}`")]
    UnknownScope(#[error(not(source))] ScopeId),

    /// Scope doesn't own a world shared by its nested scenarios.
    #[display("`{kind}` scope `{id}` is not persistent")]
    NotPersistent {
        /// ID of the scope.
        #[error(not(source))]
        id: ScopeId,

        /// Kind of the scope.
        #[error(not(source))]
        kind: ScopeKind,
    },

    /// Root of a plan is not a [`ScopeKind::Root`].
    #[display("plan root must be a `root` scope, found `{_0}`")]
    InvalidRoot(#[error(not(source))] ScopeKind),

    /// Scope is nested under a scope that cannot contain it.
    #[display("`{child}` scope `{name}` cannot be nested into a `{parent}` scope")]
    InvalidNesting {
        /// Kind of the enclosing scope.
        #[error(not(source))]
        parent: ScopeKind,

        /// Kind of the nested scope.
        #[error(not(source))]
        child: ScopeKind,

        /// Name of the nested scope.
        #[error(not(source))]
        name: String,
    },

    /// Step text doesn't match its definition pattern.
    #[display("step `{text}` doesn't match `{pattern}`")]
    StepMismatch {
        /// Text of the step.
        #[error(not(source))]
        text: String,

        /// Pattern of the step definition.
        #[error(not(source))]
        pattern: String,
    },

    /// Step requires a data table, but none is attached.
    #[display("step `{step}` requires a data table")]
    MissingTable {
        /// Text of the step.
        #[error(not(source))]
        step: String,
    },

    /// Step requires a docstring, but none is attached.
    #[display("step `{step}` requires a docstring")]
    MissingDocstring {
        /// Text of the step.
        #[error(not(source))]
        step: String,
    },

    /// Attached data table cannot be shaped as requested.
    #[display("invalid data table: {_0}")]
    #[from]
    Table(#[error(source)] TableError),

    /// Invalid engine configuration.
    #[display("configuration error: {_0}")]
    #[from]
    Config(#[error(source)] ConfigError),
}

impl Error {
    /// Wraps an error returned by a handler.
    #[must_use]
    pub fn handler(err: impl Into<BoxError>) -> Self {
        Self::Handler(Arc::from(err.into()))
    }

    /// Normalizes a panic payload caught with [`catch_unwind()`].
    ///
    /// [`catch_unwind()`]: futures::FutureExt::catch_unwind
    #[must_use]
    pub fn from_panic(payload: Box<dyn Any + Send + 'static>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_owned()
        } else {
            "(could not resolve panic payload)".to_owned()
        };
        Self::Panicked { message, payload: Arc::new(Mutex::new(payload)) }
    }

    /// Returns the original errors of an [`Error::Aggregate`], or an empty
    /// slice for any other variant.
    #[must_use]
    pub fn causes(&self) -> &[Self] {
        match self {
            Self::Aggregate { causes, .. } => causes,
            _ => &[],
        }
    }

    /// Indicates whether this is an [`Error::Aggregate`].
    #[must_use]
    pub const fn is_aggregate(&self) -> bool {
        matches!(self, Self::Aggregate { .. })
    }

    /// Returns the handler error downcast to `E`, if this [`Error`] wraps one.
    #[must_use]
    pub fn downcast_ref<E: StdError + 'static>(&self) -> Option<&E> {
        match self {
            Self::Handler(e) => e.downcast_ref::<E>(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{error::Error as _, io};

    use super::*;

    #[test]
    fn wraps_handler_errors_as_is() {
        let err = Error::handler(io::Error::new(io::ErrorKind::Other, "boom"));

        assert_eq!(err.to_string(), "boom");
        assert!(err.downcast_ref::<io::Error>().is_some());
        assert!(err.source().is_some());
    }

    #[test]
    fn normalizes_string_panics() {
        let err = Error::from_panic(Box::new("oh no".to_owned()));
        assert_eq!(err.to_string(), "oh no");

        let err = Error::from_panic(Box::new("static"));
        assert_eq!(err.to_string(), "static");
    }

    #[test]
    fn preserves_opaque_panic_payloads() {
        let err = Error::from_panic(Box::new(42_u8));

        let Error::Panicked { message, payload } = err else {
            panic!("expected `Error::Panicked`");
        };
        assert_eq!(message, "(could not resolve panic payload)");
        assert_eq!(payload.lock().unwrap().downcast_ref::<u8>(), Some(&42));
    }

    #[test]
    fn exposes_aggregate_causes() {
        let err = Error::Aggregate {
            phase: Phase::Dispose,
            causes: vec![Error::ExpectedFailure, Error::NoActiveScenario],
        };

        assert!(err.is_aggregate());
        assert_eq!(err.causes().len(), 2);
        assert_eq!(
            err.to_string(),
            "Multiple errors occurred while disposing world resources",
        );
        assert!(Error::ExpectedFailure.causes().is_empty());
    }
}
