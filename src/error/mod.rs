// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Error handling types of the engine.
//!
//! # Modules
//!
//! - [`core`] - Main [`Error`] type.
//! - [`aggregate`] - [`Failures`] accumulator and aggregate [`Phase`]s.
//! - [`config`] - Configuration errors.
//! - [`table`] - Data table shaping errors.

pub mod aggregate;
pub mod config;
pub mod core;
pub mod table;

pub use self::{
    aggregate::{Failures, Phase},
    config::ConfigError,
    core::{BoxError, Error, Result},
    table::TableError,
};
