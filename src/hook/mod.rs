// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Lifecycle hooks declared on scopes.
//!
//! - [`definition`]: [`HookDefinition`], [`HookType`] and [`HookOptions`]
//! - [`context`]: [`Context`] a hook is invoked with
//! - [`collection`]: [`HookCollection`] of a scope chain

pub mod collection;
pub mod context;
pub mod definition;

pub use self::{
    collection::{HookCollection, ResolvedHook},
    context::{Context, HookMetadata, HookStepInfo, ScenarioInfo},
    definition::{
        HookData, HookDefinition, HookFn, HookOptions, HookPhase, HookType,
        DEFAULT_ORDER,
    },
};
