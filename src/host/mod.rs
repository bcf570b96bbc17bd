// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Host test [`Runtime`]s scenarios are registered with.
//!
//! The engine never schedules scenarios itself: it registers suites and
//! tests with a [`Runtime`], which decides when to run them, how to report
//! them and whether to abort them on a timeout.
//!
//! [`Basic`] is a sequential in-process [`Runtime`].

pub mod basic;

use futures::future::BoxFuture;

use crate::{error, mode::Variant, timeout::ResolvedTimeout};

#[doc(inline)]
pub use self::basic::{Basic, CurrentTest, Outcome, Report, TestReport};

/// Body of a test or of a suite hook registered with a [`Runtime`].
pub type TestBody =
    Box<dyn FnOnce() -> BoxFuture<'static, error::Result<()>> + Send>;

/// Registration primitives of a host test runtime.
pub trait Runtime {
    /// Registers a suite with the given `name`, whose tests and nested suites
    /// are registered by the `define` callback.
    fn suite<F>(&mut self, name: &str, variant: Variant, define: F)
    where
        F: FnOnce(&mut Self);

    /// Registers a test with the given `name` in the current suite.
    ///
    /// The `timeout` is [`None`] if the runtime default applies.
    fn test(
        &mut self,
        name: &str,
        variant: Variant,
        timeout: Option<ResolvedTimeout>,
        body: TestBody,
    );

    /// Registers a hook running once before all the tests of the current
    /// suite.
    fn before_all(&mut self, body: TestBody);

    /// Registers a hook running once after all the tests of the current
    /// suite.
    fn after_all(&mut self, body: TestBody);

    /// Indicates whether this runtime natively supports the given
    /// [`Variant`].
    ///
    /// Unsupported [`Variant::Pending`] tests are registered as skipped,
    /// while unsupported [`Variant::Failing`] ones are registered with their
    /// body wrapped into [`expect_failure()`].
    ///
    /// [`expect_failure()`]: crate::mode::expect_failure
    fn supports(&self, variant: Variant) -> bool;

    /// Returns the full name of the test being run, if any.
    fn current_test_name(&self) -> Option<String>;
}
