// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Orchestration of scope lifecycles: hooks, persistent worlds and full
//! scenario runs.
//!
//! # Order guarantees
//!
//! Hooks of a single phase are invoked strictly one after another, in the
//! order of [`ordering::compare()`] for "before" phases and in the reverse
//! one for "after" phases. Before hooks of a persistent scope complete before
//! any scenario nested under it starts, while its after hooks run only once
//! it's torn down.

pub mod ordering;
mod persistent;

use std::{fmt, future::Future, sync::Arc};

use async_trait::async_trait;
use futures::lock::Mutex;
use tracing::Instrument as _;

use self::{
    ordering::{invoke_hooks, order_hooks, Invocation},
    persistent::States,
};
use crate::{
    adapter::{Adapter, PlanAdapter},
    config::Config,
    error::{Failures, Phase, Result},
    execution::{ScenarioExecution, StepStatus},
    hook::{
        HookCollection, HookMetadata, HookPhase, HookStepInfo, HookType,
        ResolvedHook, ScenarioInfo,
    },
    runner::{execute_steps, StepHooks},
    runtime::ScopeInfo,
    step::ResolvedStep,
    timeout::TimeoutSpec,
    world::{dispose_world, with_current_world, SharedWorld, World},
};

/// Orchestrator of hooks and [`World`]s over the scopes of an [`Adapter`].
///
/// Shared by every scenario of a run, so that persistent scopes are
/// materialized once and torn down once.
pub struct Lifecycle<W, A = PlanAdapter<W>> {
    /// [`Adapter`] of the plan.
    adapter: Arc<A>,

    /// [`Config`] of the run.
    config: Config,

    /// Open persistent scopes.
    states: Mutex<States<W>>,
}

// Implemented manually to omit redundant `W: Debug` trait bound, imposed by
// `#[derive(Debug)]`.
impl<W, A: fmt::Debug> fmt::Debug for Lifecycle<W, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lifecycle")
            .field("adapter", &self.adapter)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<W, A> Lifecycle<W, A> {
    /// Creates a new [`Lifecycle`] with no open scopes.
    #[must_use]
    pub fn new(adapter: Arc<A>, config: Config) -> Self {
        Self { adapter, config, states: Mutex::new(States::new()) }
    }

    /// Returns the [`Adapter`] of this [`Lifecycle`].
    #[must_use]
    pub const fn adapter(&self) -> &Arc<A> {
        &self.adapter
    }

    /// Returns the [`Config`] of this [`Lifecycle`].
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }
}

impl<W: World, A: Adapter<W>> Lifecycle<W, A> {
    /// Runs the given `execution` to a terminal status, with its steps
    /// executed by [`execute_steps()`].
    ///
    /// # Errors
    ///
    /// See [`Lifecycle::run_scenario_with()`].
    pub async fn run_scenario(
        &self,
        execution: &ScenarioExecution<W>,
    ) -> Result<()> {
        self.run_scenario_with(execution, |world, hooks| async move {
            execute_steps(execution, &world, &hooks).await
        })
        .await
    }

    /// Runs the given `execution` to a terminal status, with its steps
    /// executed by the given `steps` callback.
    ///
    /// 1. Resolves the [`World`] of the nearest persistent enclosing scope.
    /// 2. Creates the scenario's own [`World`].
    /// 3. Runs the before-scenario hooks.
    /// 4. Runs the `steps`, unless any before-scenario hook has failed.
    /// 5. Always runs the after-scenario hooks, with the scenario's status.
    /// 6. Always disposes the scenario's [`World`].
    ///
    /// Steps 3 to 6 run with the scenario's [`World`] being the
    /// [`current_world()`]. It's locked only to be disposed, so hooks and
    /// steps may lock it on their own.
    ///
    /// A pending `execution` is marked so right away, and nothing is run.
    ///
    /// # Errors
    ///
    /// - The single error raised by any of the steps above.
    /// - [`Error::Aggregate`] of [`Phase::Scenario`], if several are raised.
    ///
    /// [`current_world()`]: crate::world::current_world
    /// [`Error::Aggregate`]: crate::Error::Aggregate
    pub async fn run_scenario_with<F, Fut>(
        &self,
        execution: &ScenarioExecution<W>,
        steps: F,
    ) -> Result<()>
    where
        F: FnOnce(SharedWorld<W>, ScenarioHooks<W>) -> Fut + Send,
        Fut: Future<Output = Result<()>> + Send,
    {
        let span = tracing::info_span!(
            "scenario",
            id = %execution.id,
            name = %execution.qualified_name,
        );
        self.run(execution, steps).instrument(span).await
    }

    /// Body of [`Lifecycle::run_scenario_with()`].
    async fn run<F, Fut>(
        &self,
        execution: &ScenarioExecution<W>,
        steps: F,
    ) -> Result<()>
    where
        F: FnOnce(SharedWorld<W>, ScenarioHooks<W>) -> Fut + Send,
        Fut: Future<Output = Result<()>> + Send,
    {
        if execution.pending {
            _ = execution.mark_pending(execution.pending_reason.clone());
            return Ok(());
        }

        let world = match self.scenario_world(execution).await {
            Ok(w) => Arc::new(Mutex::new(w)),
            Err(e) => {
                _ = execution.mark_failed(e.clone());
                return Err(e);
            }
        };

        let hooks =
            HookCollection::collect(&execution.chain(self.adapter.plan().root()));
        let step_hooks = ScenarioHooks::new(&hooks, execution, self.config.clone());
        let info = execution.info();
        let meta = HookMetadata::new(&*execution.scope).with_scenario(info.clone());

        let body = async {
            let mut failures = Failures::new();
            let inv = Invocation {
                tags: &execution.tags,
                meta: meta.clone(),
                timeout: execution.timeout,
                config: &self.config,
            };

            let before = order_hooks(
                hooks.get(HookType::BeforeScenario),
                HookPhase::Before,
            );
            let res = invoke_hooks(&before, &world, &inv).await;
            match res {
                Ok(()) => {
                    let res = steps(Arc::clone(&world), step_hooks).await;
                    if !execution.status().is_terminal() {
                        _ = match &res {
                            Ok(()) => execution.mark_passed(),
                            Err(e) => execution.mark_failed(e.clone()),
                        };
                    }
                    _ = failures.record(res);
                }
                Err(e) => {
                    tracing::debug!(error = %e, "before-scenario hook failed");
                    _ = execution.mark_failed(e.clone());
                    failures.push(e);
                }
            }

            let after = order_hooks(
                hooks.get(HookType::AfterScenario),
                HookPhase::After,
            );
            let inv = Invocation { meta: meta.with_result(execution.status()), ..inv };
            _ = failures.record(invoke_hooks(&after, &world, &inv).await);
            _ = failures.record(dispose_world(&mut *world.lock().await).await);

            failures.into_result(Phase::Scenario)
        };
        with_current_world(&world, info, body).await
    }

    /// Creates the [`World`] of the given `execution`'s own scope.
    async fn scenario_world(&self, execution: &ScenarioExecution<W>) -> Result<W> {
        let parent = self.parent_world(execution).await?;
        self.adapter
            .create_world(Some(Arc::clone(&execution.scope)), parent)
            .await
    }
}

/// [`StepHooks`] of a scenario run by a [`Lifecycle`].
pub struct ScenarioHooks<W> {
    /// Ordered before-step hooks.
    before: Vec<ResolvedHook<W>>,

    /// Ordered after-step hooks.
    after: Vec<ResolvedHook<W>>,

    /// Scope of the scenario.
    target: ScopeInfo,

    /// Scenario itself.
    scenario: ScenarioInfo,

    /// Tags of the scenario, including the inherited ones.
    tags: Vec<String>,

    /// Timeout of the scenario.
    timeout: Option<TimeoutSpec>,

    /// [`Config`] of the run.
    config: Config,
}

// Implemented manually to omit redundant `W: Debug` trait bound, imposed by
// `#[derive(Debug)]`.
impl<W> fmt::Debug for ScenarioHooks<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScenarioHooks")
            .field("before", &self.before)
            .field("after", &self.after)
            .field("scenario", &self.scenario)
            .finish_non_exhaustive()
    }
}

impl<W> ScenarioHooks<W> {
    /// Orders the step hooks of the given [`HookCollection`] for the given
    /// `execution`.
    #[must_use]
    pub fn new(
        hooks: &HookCollection<W>,
        execution: &ScenarioExecution<W>,
        config: Config,
    ) -> Self {
        Self {
            before: order_hooks(hooks.get(HookType::BeforeStep), HookPhase::Before),
            after: order_hooks(hooks.get(HookType::AfterStep), HookPhase::After),
            target: ScopeInfo::from(&*execution.scope),
            scenario: execution.info(),
            tags: execution.tags.clone(),
            timeout: execution.timeout,
            config,
        }
    }

    /// Invokes the given step `hooks`.
    async fn invoke(
        &self,
        hooks: &[ResolvedHook<W>],
        world: &SharedWorld<W>,
        step: HookStepInfo,
    ) -> Result<()> {
        if hooks.is_empty() {
            return Ok(());
        }
        let inv = Invocation {
            tags: &self.tags,
            meta: HookMetadata::new(self.target.clone())
                .with_scenario(self.scenario.clone())
                .with_step(step),
            timeout: self.timeout,
            config: &self.config,
        };
        invoke_hooks(hooks, world, &inv).await
    }
}

/// Describes the `step` at the given `index` for hooks.
fn step_info<W>(
    index: usize,
    step: &ResolvedStep<W>,
    status: Option<StepStatus>,
) -> HookStepInfo {
    HookStepInfo {
        index,
        keyword: step.keyword.clone(),
        text: step.text.clone(),
        status,
    }
}

#[async_trait]
impl<W: World> StepHooks<W> for ScenarioHooks<W> {
    async fn before_step(
        &self,
        world: &SharedWorld<W>,
        index: usize,
        step: &ResolvedStep<W>,
    ) -> Result<()> {
        self.invoke(&self.before, world, step_info(index, step, None)).await
    }

    async fn after_step(
        &self,
        world: &SharedWorld<W>,
        index: usize,
        step: &ResolvedStep<W>,
        status: StepStatus,
    ) -> Result<()> {
        self.invoke(&self.after, world, step_info(index, step, Some(status)))
            .await
    }
}
