// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Resolving a declared [`Mode`] into a host registration [`Variant`].

use derive_more::with_trait::Display;
use futures::FutureExt as _;

use crate::{
    error::Error,
    host::TestBody,
    tag,
};

/// Tag asking a host runtime to run a scenario concurrently.
pub const CONCURRENT_TAG: &str = "concurrent";

/// Tag marking a scenario as expected to fail.
pub const FAILING_TAG: &str = "failing";

/// Execution mode declared on a scope.
#[derive(Clone, Copy, Debug, Default, Display, Eq, Hash, PartialEq)]
pub enum Mode {
    /// Regular execution.
    #[default]
    #[display("default")]
    Default,

    /// Never executed.
    #[display("skip")]
    Skip,

    /// Focused: when present, only focused units are executed.
    #[display("only")]
    Only,

    /// Executed concurrently with other concurrent units.
    #[display("concurrent")]
    Concurrent,
}

/// Concrete registration function of a host runtime.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum Variant {
    /// Regular registration.
    #[display("default")]
    Default,

    /// Registered as skipped.
    #[display("skip")]
    Skip,

    /// Registered as focused.
    #[display("only")]
    Only,

    /// Registered as concurrent.
    #[display("concurrent")]
    Concurrent,

    /// Registered as expected to fail.
    #[display("failing")]
    Failing,

    /// Registered as pending (a "todo").
    #[display("pending")]
    Pending,
}

impl From<Mode> for Variant {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Default => Self::Default,
            Mode::Skip => Self::Skip,
            Mode::Only => Self::Only,
            Mode::Concurrent => Self::Concurrent,
        }
    }
}

/// Resolves the declared `mode` and the `tags` of a unit into a [`Variant`].
///
/// Explicit [`Mode::Skip`] and [`Mode::Only`] always win. Otherwise, the
/// `@failing` tag implies [`Variant::Failing`] and the `@concurrent` tag
/// implies [`Variant::Concurrent`].
#[must_use]
pub fn resolve_mode<I, S>(mode: Mode, tags: I) -> Variant
where
    S: AsRef<str>,
    I: IntoIterator<Item = S>,
{
    if matches!(mode, Mode::Skip | Mode::Only) {
        return mode.into();
    }

    let (mut failing, mut concurrent) = (false, false);
    for t in tags {
        match tag::normalize(t.as_ref()) {
            FAILING_TAG => failing = true,
            CONCURRENT_TAG => concurrent = true,
            _ => {}
        }
    }

    if failing {
        Variant::Failing
    } else if concurrent {
        Variant::Concurrent
    } else {
        mode.into()
    }
}

/// Wraps the given `body` so that its success is reported as
/// [`Error::ExpectedFailure`], while its failure is reported as a success.
///
/// Used for [`Variant::Failing`] when a host runtime has no native support
/// for it.
#[must_use]
pub fn expect_failure(body: TestBody) -> TestBody {
    Box::new(move || {
        async move {
            match body().await {
                Ok(()) => Err(Error::ExpectedFailure),
                Err(e) => {
                    tracing::debug!(error = %e, "scenario failed as expected");
                    Ok(())
                }
            }
        }
        .boxed()
    })
}

/// Resolves the [`Variant`] and the body a unit should be registered with.
///
/// If the unit resolves to [`Variant::Failing`] and the host runtime has no
/// `native_failing` support, it's registered as [`Variant::Default`] with its
/// body wrapped into [`expect_failure()`].
#[must_use]
pub fn resolve_registration<I, S>(
    mode: Mode,
    tags: I,
    native_failing: bool,
    body: TestBody,
) -> (Variant, TestBody)
where
    S: AsRef<str>,
    I: IntoIterator<Item = S>,
{
    match resolve_mode(mode, tags) {
        Variant::Failing if !native_failing => {
            (Variant::Default, expect_failure(body))
        }
        v => (v, body),
    }
}
