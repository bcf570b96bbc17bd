// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Static scope tree: features, rules, scenarios and scenario outlines.
//!
//! - [`id`]: process-unique identifiers
//! - [`node`]: [`ScopeNode`] and its [`ScopeKind`]
//! - [`plan`]: [`ScopePlan`] indexing a whole tree

pub mod id;
pub mod node;
pub mod plan;

pub use self::{
    id::{ExecutionId, HookId, ScopeId, StepId},
    node::{inherited_tags, Example, ScopeKind, ScopeNode},
    plan::{ParameterRegistry, ScopePlan},
};
