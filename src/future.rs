// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Aiding [`Future`]s of user-provided handlers.

use std::{future::Future, panic::AssertUnwindSafe, pin::Pin, task};

use futures::{future::CatchUnwind, FutureExt as _};
use pin_project::pin_project;

use crate::error::{BoxError, Error};

/// Extensions of a [`Future`], used inside this crate.
pub(crate) trait FutureExt: Future + Sized {
    /// Catches a panic of this [`Future`] into an [`Error::Panicked`].
    fn catch_panic(self) -> CatchPanic<Self> {
        CatchPanic(AssertUnwindSafe(self).catch_unwind())
    }
}

impl<T: Future> FutureExt for T {}

/// [`Future`] returned by the [`FutureExt::catch_panic()`] method.
#[pin_project]
pub(crate) struct CatchPanic<F>(#[pin] CatchUnwind<AssertUnwindSafe<F>>);

impl<F: Future> Future for CatchPanic<F> {
    type Output = Result<F::Output, Error>;

    fn poll(
        self: Pin<&mut Self>,
        cx: &mut task::Context<'_>,
    ) -> task::Poll<Self::Output> {
        self.project().0.poll(cx).map(|r| r.map_err(Error::from_panic))
    }
}

/// Awaits a handler `fut`, normalizing both its error and its panic into an
/// [`Error`].
pub(crate) async fn guard<F, T, E>(fut: F) -> Result<T, Error>
where
    F: Future<Output = Result<T, E>>,
    E: Into<BoxError>,
{
    fut.catch_panic().await?.map_err(Error::handler)
}
