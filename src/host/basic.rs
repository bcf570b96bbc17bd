// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Default in-process [`Runtime`] implementation.

use std::{
    fmt,
    future::Future,
    mem,
    pin::Pin,
    sync::{Arc, Mutex, PoisonError},
    task,
};

use derive_more::with_trait::Display;
use futures::future::{self, FutureExt as _, LocalBoxFuture};
use itertools::Itertools as _;
use pin_project::pin_project;

use super::{Runtime, TestBody};
use crate::{
    error::Error,
    execution::QUALIFIED_NAME_SEPARATOR,
    future::FutureExt as _,
    mode::Variant,
    timeout::ResolvedTimeout,
};

/// Outcome of a test run by [`Basic`].
#[derive(Clone, Debug, Display)]
pub enum Outcome {
    /// Test has passed.
    #[display("passed")]
    Passed,

    /// Test has failed with the given [`Error`].
    #[display("failed: {_0}")]
    Failed(Error),

    /// Test wasn't run.
    #[display("skipped")]
    Skipped,

    /// Test is registered as pending.
    #[display("pending")]
    Pending,
}

impl Outcome {
    /// Indicates whether this is an [`Outcome::Failed`].
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// Report of a single test run by [`Basic`].
#[derive(Clone, Debug)]
pub struct TestReport {
    /// Name of the test prefixed with the names of its suites.
    pub name: String,

    /// [`Variant`] the test was registered with.
    pub variant: Variant,

    /// Timeout the test was registered with.
    ///
    /// [`Basic`] records it, but doesn't enforce it.
    pub timeout: Option<ResolvedTimeout>,

    /// [`Outcome`] of the test.
    pub outcome: Outcome,
}

/// Report of a whole [`Basic::run()`].
#[derive(Clone, Debug, Default)]
pub struct Report {
    /// Tests in the order they've finished.
    pub tests: Vec<TestReport>,

    /// Failed suite hooks along with the names of their suites.
    pub hook_failures: Vec<(String, Error)>,
}

impl Report {
    /// Looks up the [`Outcome`] of the test with the given full `name`.
    #[must_use]
    pub fn outcome(&self, name: &str) -> Option<&Outcome> {
        self.tests.iter().find(|t| t.name == name).map(|t| &t.outcome)
    }

    /// Returns the number of failed tests.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.tests.iter().filter(|t| t.outcome.is_failed()).count()
    }

    /// Returns the number of passed tests.
    #[must_use]
    pub fn passed(&self) -> usize {
        self.tests
            .iter()
            .filter(|t| matches!(t.outcome, Outcome::Passed))
            .count()
    }

    /// Indicates whether neither any test nor any suite hook has failed.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed() == 0 && self.hook_failures.is_empty()
    }
}

/// Handle to the name of the test being currently run by [`Basic`].
///
/// Concurrent tests are polled one at a time, and each of them sees its own
/// name while being polled.
#[derive(Clone, Debug, Default)]
pub struct CurrentTest(Arc<Mutex<Option<String>>>);

impl CurrentTest {
    /// Returns the full name of the test being run, if any.
    #[must_use]
    pub fn name(&self) -> Option<String> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn replace(&self, name: Option<String>) -> Option<String> {
        let mut slot = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        mem::replace(&mut *slot, name)
    }
}

/// [`Future`] of a test body, having its test name as the [`CurrentTest`]
/// whenever it's polled.
#[pin_project]
struct Named<F> {
    #[pin]
    inner: F,
    name: String,
    current: CurrentTest,
}

impl<F: Future> Future for Named<F> {
    type Output = F::Output;

    fn poll(
        self: Pin<&mut Self>,
        cx: &mut task::Context<'_>,
    ) -> task::Poll<Self::Output> {
        let this = self.project();
        let prev = this.current.replace(Some(this.name.clone()));
        let poll = this.inner.poll(cx);
        _ = this.current.replace(prev);
        poll
    }
}

struct Test {
    name: String,
    variant: Variant,
    timeout: Option<ResolvedTimeout>,
    body: TestBody,
}

enum Item {
    Suite(Suite),
    Test(Test),
}

struct Suite {
    name: String,
    variant: Variant,
    items: Vec<Item>,
    before_all: Vec<TestBody>,
    after_all: Vec<TestBody>,
}

impl Suite {
    fn new(name: impl Into<String>, variant: Variant) -> Self {
        Self {
            name: name.into(),
            variant,
            items: Vec::new(),
            before_all: Vec::new(),
            after_all: Vec::new(),
        }
    }

    /// Indicates whether this suite or anything inside it is focused.
    fn has_only(&self) -> bool {
        self.variant == Variant::Only
            || self.items.iter().any(|i| match i {
                Item::Suite(s) => s.has_only(),
                Item::Test(t) => t.variant == Variant::Only,
            })
    }

    /// Collects the full names of every test inside this suite.
    fn test_names(&self, path: &[String], out: &mut Vec<(String, Variant)>) {
        let path = join(path, &self.name);
        for item in &self.items {
            match item {
                Item::Suite(s) => s.test_names(&path, out),
                Item::Test(t) => out.push((full_name(&path, &t.name), t.variant)),
            }
        }
    }
}

/// Sequential in-process [`Runtime`].
///
/// - Honours [`Variant::Only`]: once anything is focused, unfocused tests are
///   reported as skipped without being run.
/// - Never runs [`Variant::Skip`] tests and suites.
/// - Runs consecutive [`Variant::Concurrent`] tests of a suite concurrently.
/// - Reports [`Variant::Pending`] tests without running them.
/// - Supports [`Variant::Failing`] natively, if configured so.
/// - Runs after-all hooks of a suite once all its tests have finished.
///
/// Timeouts are recorded in the [`Report`], but not enforced.
pub struct Basic {
    /// Root suite.
    root: Suite,

    /// Suites being defined, the innermost last.
    stack: Vec<Suite>,

    /// Indicates whether [`Variant::Failing`] is supported natively.
    native_failing: bool,

    /// Test being run.
    current: CurrentTest,
}

impl fmt::Debug for Basic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Basic")
            .field("native_failing", &self.native_failing)
            .field("current", &self.current)
            .finish_non_exhaustive()
    }
}

impl Default for Basic {
    fn default() -> Self {
        Self {
            root: Suite::new("", Variant::Default),
            stack: Vec::new(),
            native_failing: false,
            current: CurrentTest::default(),
        }
    }
}

impl Basic {
    /// Creates a new empty [`Basic`] runtime.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes this runtime natively support [`Variant::Failing`].
    #[must_use]
    pub const fn native_failing(mut self, enabled: bool) -> Self {
        self.native_failing = enabled;
        self
    }

    /// Returns a [`CurrentTest`] handle, readable from inside test bodies.
    #[must_use]
    pub fn tracker(&self) -> CurrentTest {
        self.current.clone()
    }

    /// Returns the full names of the registered tests, in registration order.
    #[must_use]
    pub fn registered(&self) -> Vec<(String, Variant)> {
        let mut out = Vec::new();
        self.root.test_names(&[], &mut out);
        out
    }

    /// Runs every registered test, draining the registrations.
    pub async fn run(&mut self) -> Report {
        let root = mem::replace(&mut self.root, Suite::new("", Variant::Default));
        let focus = root.has_only();

        let mut report = Report::default();
        self.run_suite(root, Vec::new(), Scope { focus, focused: false }, &mut report)
            .await;
        report
    }

    fn current_suite(&mut self) -> &mut Suite {
        self.stack.last_mut().unwrap_or(&mut self.root)
    }

    fn run_suite<'a>(
        &'a self,
        suite: Suite,
        parent: Vec<String>,
        scope: Scope,
        report: &'a mut Report,
    ) -> LocalBoxFuture<'a, ()> {
        async move {
            let path = join(&parent, &suite.name);
            let scope = Scope {
                focused: scope.focused || suite.variant == Variant::Only,
                ..scope
            };

            if suite.variant == Variant::Skip
                || (scope.focus && !scope.focused && !suite.has_only())
            {
                skip_all(&suite, &parent, report);
                return;
            }

            let suite_name = path.iter().join(QUALIFIED_NAME_SEPARATOR);
            for hook in suite.before_all {
                if let Err(e) = run_body(hook).await {
                    tracing::debug!(suite = %suite_name, error = %e, "before-all hook failed");
                    report.hook_failures.push((suite_name.clone(), e));
                }
            }

            let mut batch = Vec::new();
            for item in suite.items {
                match item {
                    Item::Test(t)
                        if t.variant == Variant::Concurrent
                            && scope.runs(t.variant) =>
                    {
                        batch.push(t);
                    }
                    item => {
                        self.run_batch(mem::take(&mut batch), &path, report).await;
                        match item {
                            Item::Test(t) => {
                                let outcome = if scope.runs(t.variant) {
                                    self.run_test(&path, &t.name, t.variant, t.body)
                                        .await
                                } else {
                                    not_run(t.variant)
                                };
                                report.tests.push(TestReport {
                                    name: full_name(&path, &t.name),
                                    variant: t.variant,
                                    timeout: t.timeout,
                                    outcome,
                                });
                            }
                            Item::Suite(s) => {
                                self.run_suite(s, path.clone(), scope, report).await;
                            }
                        }
                    }
                }
            }
            self.run_batch(batch, &path, report).await;

            for hook in suite.after_all {
                if let Err(e) = run_body(hook).await {
                    tracing::debug!(suite = %suite_name, error = %e, "after-all hook failed");
                    report.hook_failures.push((suite_name.clone(), e));
                }
            }
        }
        .boxed_local()
    }

    /// Runs the given concurrent tests all at once.
    async fn run_batch(&self, batch: Vec<Test>, path: &[String], report: &mut Report) {
        if batch.is_empty() {
            return;
        }
        let (meta, bodies): (Vec<_>, Vec<_>) = batch
            .into_iter()
            .map(|t| ((t.name, t.variant, t.timeout), t.body))
            .unzip();
        let outcomes = future::join_all(
            meta.iter()
                .zip(bodies)
                .map(|((name, variant, _), body)| {
                    self.run_test(path, name, *variant, body)
                }),
        )
        .await;
        for ((name, variant, timeout), outcome) in meta.into_iter().zip(outcomes) {
            report.tests.push(TestReport {
                name: full_name(path, &name),
                variant,
                timeout,
                outcome,
            });
        }
    }

    /// Runs a single test `body`.
    async fn run_test(
        &self,
        path: &[String],
        name: &str,
        variant: Variant,
        body: TestBody,
    ) -> Outcome {
        let full = full_name(path, name);
        tracing::debug!(test = %full, %variant, "running test");
        let res = Named {
            inner: run_body(body),
            name: full,
            current: self.current.clone(),
        }
        .await;

        match (variant, res) {
            (Variant::Failing, Ok(())) => Outcome::Failed(Error::ExpectedFailure),
            (Variant::Failing, Err(_)) | (_, Ok(())) => Outcome::Passed,
            (_, Err(e)) => Outcome::Failed(e),
        }
    }
}

impl Runtime for Basic {
    fn suite<F>(&mut self, name: &str, variant: Variant, define: F)
    where
        F: FnOnce(&mut Self),
    {
        self.stack.push(Suite::new(name, variant));
        define(self);
        if let Some(suite) = self.stack.pop() {
            self.current_suite().items.push(Item::Suite(suite));
        }
    }

    fn test(
        &mut self,
        name: &str,
        variant: Variant,
        timeout: Option<ResolvedTimeout>,
        body: TestBody,
    ) {
        self.current_suite().items.push(Item::Test(Test {
            name: name.to_owned(),
            variant,
            timeout,
            body,
        }));
    }

    fn before_all(&mut self, body: TestBody) {
        self.current_suite().before_all.push(body);
    }

    fn after_all(&mut self, body: TestBody) {
        self.current_suite().after_all.push(body);
    }

    fn supports(&self, variant: Variant) -> bool {
        variant != Variant::Failing || self.native_failing
    }

    fn current_test_name(&self) -> Option<String> {
        self.current.name()
    }
}

/// Focus state of the suite being run.
#[derive(Clone, Copy, Debug)]
struct Scope {
    /// Indicates whether anything is focused in the whole run.
    focus: bool,

    /// Indicates whether the suite being run is focused itself.
    focused: bool,
}

impl Scope {
    /// Indicates whether a test of the given [`Variant`] is run.
    fn runs(self, variant: Variant) -> bool {
        match variant {
            Variant::Skip | Variant::Pending => false,
            Variant::Only => true,
            _ => !self.focus || self.focused,
        }
    }
}

/// Runs a test or hook `body`, treating its panic as a failure.
async fn run_body(body: TestBody) -> Result<(), Error> {
    body().catch_panic().await?
}

/// Returns the [`Outcome`] of a test of the given [`Variant`], which wasn't
/// run.
const fn not_run(variant: Variant) -> Outcome {
    match variant {
        Variant::Pending => Outcome::Pending,
        _ => Outcome::Skipped,
    }
}

/// Reports every test of the given `suite` as not run.
fn skip_all(suite: &Suite, parent: &[String], report: &mut Report) {
    let mut names = Vec::new();
    suite.test_names(parent, &mut names);
    report.tests.extend(names.into_iter().map(|(name, variant)| TestReport {
        name,
        variant,
        timeout: None,
        outcome: not_run(variant),
    }));
}

fn join(path: &[String], name: &str) -> Vec<String> {
    let mut out = path.to_vec();
    if !name.is_empty() {
        out.push(name.to_owned());
    }
    out
}

fn full_name(path: &[String], name: &str) -> String {
    path.iter()
        .map(String::as_str)
        .chain(Some(name))
        .join(QUALIFIED_NAME_SEPARATOR)
}
