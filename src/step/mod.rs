// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Steps: their definitions, the [`Context`] handlers are invoked with, and
//! the [`Signal`]s they return.
//!
//! - [`context`]: [`Context`] of a handler invocation
//! - [`definition`]: [`StepDefinition`] and [`ResolvedStep`]
//! - [`location`]: source [`Location`]s
//! - [`signal`]: [`Signal`], [`Pending`] and the step [`Result`]

pub mod context;
pub mod definition;
pub mod location;
pub mod signal;

pub use self::{
    context::{CaptureName, Context},
    definition::{ResolvedStep, StepDefinition, StepFn},
    location::Location,
    signal::{pending, Pending, Result, Signal},
};

#[doc(no_inline)]
pub use gherkin::StepType;
