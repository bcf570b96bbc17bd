// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![forbid(non_ascii_idents, unsafe_code)]
#![warn(
    clippy::all,
    clippy::must_use_candidate,
    clippy::pedantic,
    missing_debug_implementations,
    missing_docs,
    rust_2018_idioms,
    unused_results
)]
#![allow(clippy::module_name_repetitions, clippy::missing_panics_doc)]

pub mod adapter;
pub mod config;
pub mod error;
pub mod execution;
mod future;
pub mod hook;
pub mod host;
pub mod lifecycle;
pub mod mode;
pub mod plan;
pub mod registrar;
pub mod runner;
pub mod runtime;
pub mod scope;
pub mod step;
pub mod tag;
pub mod timeout;
pub mod world;

#[doc(no_inline)]
pub use gherkin;

#[doc(inline)]
pub use self::{
    adapter::{Adapter, PlanAdapter, ScenarioSummary},
    config::{Cli, Config},
    error::{Error, Result},
    execution::{ScenarioExecution, ScenarioStatus, StepStatus},
    hook::{HookDefinition, HookType},
    host::{Runtime, TestBody},
    lifecycle::Lifecycle,
    mode::{Mode, Variant},
    plan::{FeaturePlan, PlanNode, TestPlan},
    registrar::{register_feature_plan, register_test_plan},
    runner::run_scenario_execution,
    runtime::StepRuntime,
    scope::{ScopeId, ScopeKind, ScopeNode, ScopePlan},
    step::{Pending, ResolvedStep, Signal, StepDefinition},
    tag::{tag_filter, TagFilter},
    timeout::{resolve_hook_timeout, resolve_timeout, TimeoutSpec},
    world::{current_world, Dispose, SharedWorld, World, WorldFactory},
};
