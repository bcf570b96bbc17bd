// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! [`Context`] of a hook invocation.

use std::{any::Any, fmt};

use super::definition::HookData;
use crate::{
    config::Logger,
    execution::{ScenarioStatus, StepStatus},
    runtime::ScopeInfo,
    scope::{ExecutionId, ScopeNode},
    world::SharedWorld,
};

/// Scenario a hook is invoked for.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ScenarioInfo {
    /// ID of the scenario execution.
    pub id: ExecutionId,

    /// Name of the scenario.
    pub name: String,

    /// Name of the scenario prefixed with the names of its enclosing scopes.
    pub qualified_name: String,

    /// Tags of the scenario, including the inherited ones.
    pub tags: Vec<String>,
}

/// Step a step hook is invoked for.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct HookStepInfo {
    /// Zero-based index of the step in its scenario.
    pub index: usize,

    /// Keyword of the step.
    pub keyword: String,

    /// Text of the step.
    pub text: String,

    /// Status of the step, known in after-step hooks only.
    pub status: Option<StepStatus>,
}

/// Metadata of a hook invocation.
#[derive(Clone, Debug)]
pub struct HookMetadata {
    /// Scope the hook is invoked for.
    pub target: ScopeInfo,

    /// Scenario the hook is invoked for, if any.
    pub scenario: Option<ScenarioInfo>,

    /// Step the hook is invoked for, if any.
    pub step: Option<HookStepInfo>,

    /// Result of the scenario, known in after-scenario hooks only.
    pub result: Option<ScenarioStatus>,
}

impl HookMetadata {
    /// Creates new [`HookMetadata`] targeting the given scope.
    #[must_use]
    pub fn new(target: impl Into<ScopeInfo>) -> Self {
        Self { target: target.into(), scenario: None, step: None, result: None }
    }

    /// Sets the [`ScenarioInfo`].
    #[must_use]
    pub fn with_scenario(mut self, scenario: ScenarioInfo) -> Self {
        self.scenario = Some(scenario);
        self
    }

    /// Sets the [`HookStepInfo`].
    #[must_use]
    pub fn with_step(mut self, step: HookStepInfo) -> Self {
        self.step = Some(step);
        self
    }

    /// Sets the [`ScenarioStatus`].
    #[must_use]
    pub fn with_result(mut self, result: ScenarioStatus) -> Self {
        self.result = Some(result);
        self
    }
}

/// Context of a hook invocation.
pub struct Context<'a, W> {
    /// World the hook is invoked with, unlocked.
    pub world: &'a SharedWorld<W>,

    /// Scope the hook is declared on.
    pub scope: &'a ScopeNode<W>,

    /// [`HookMetadata`] of the invocation.
    pub meta: HookMetadata,

    /// Opaque data of the hook.
    pub data: Option<&'a HookData>,

    /// [`Logger`] of the run.
    pub(crate) logger: Option<Logger>,
}

// Implemented manually to omit redundant `W: Debug` trait bound, imposed by
// `#[derive(Debug)]`.
impl<W> fmt::Debug for Context<'_, W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("scope", &self.scope.id)
            .field("meta", &self.meta)
            .finish_non_exhaustive()
    }
}

impl<W> Context<'_, W> {
    /// Logs the given `message` with the run's [`Logger`], if any.
    pub fn log(&self, message: &str) {
        tracing::info!(
            scope = %self.meta.target.name,
            kind = %self.meta.target.kind,
            "{message}",
        );
        if let Some(logger) = &self.logger {
            logger(message);
        }
    }

    /// Returns the opaque data of the hook downcast to `T`.
    #[must_use]
    pub fn data<T: Any>(&self) -> Option<&T> {
        self.data.and_then(|d| d.downcast_ref::<T>())
    }
}
