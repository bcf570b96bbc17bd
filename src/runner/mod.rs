// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Tools for executing the steps of a [`ScenarioExecution`].
//!
//! [`execute_steps()`] is the step loop shared by a full lifecycle run and by
//! [`run_scenario_execution()`], which runs a scenario without any hooks.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::Instrument as _;

use crate::{
    error::{Error, Failures, Phase, Result},
    execution::{ScenarioExecution, StepStatus},
    future::FutureExt as _,
    runtime::{ScopeInfo, StepMetadata, StepRuntime},
    scope::ScopeNode,
    step::{self, ResolvedStep, Signal},
    world::{dispose_world, with_current_world, SharedWorld, World},
};

/// Hooks executed around every step of a scenario.
#[async_trait]
pub trait StepHooks<W: Send>: Send + Sync {
    /// Executed before the step at the given `index`.
    ///
    /// # Errors
    ///
    /// If any hook fails. The step is not executed then.
    async fn before_step(
        &self,
        world: &SharedWorld<W>,
        index: usize,
        step: &ResolvedStep<W>,
    ) -> Result<()>;

    /// Executed after the step at the given `index` with its `status`.
    ///
    /// # Errors
    ///
    /// If any hook fails.
    async fn after_step(
        &self,
        world: &SharedWorld<W>,
        index: usize,
        step: &ResolvedStep<W>,
        status: StepStatus,
    ) -> Result<()>;
}

/// [`StepHooks`] doing nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoHooks;

#[async_trait]
impl<W: Send> StepHooks<W> for NoHooks {
    async fn before_step(
        &self,
        _: &SharedWorld<W>,
        _: usize,
        _: &ResolvedStep<W>,
    ) -> Result<()> {
        Ok(())
    }

    async fn after_step(
        &self,
        _: &SharedWorld<W>,
        _: usize,
        _: &ResolvedStep<W>,
        _: StepStatus,
    ) -> Result<()> {
        Ok(())
    }
}

/// Outcome of a single step.
enum Outcome {
    Passed,
    Pending(Option<String>),
    Failed(Error),
}

impl Outcome {
    const fn status(&self) -> StepStatus {
        match self {
            Self::Passed => StepStatus::Passed,
            Self::Pending(_) => StepStatus::Pending,
            Self::Failed(_) => StepStatus::Failed,
        }
    }
}

/// Builds the [`StepMetadata`] of the `step` at the given `index` of the
/// `execution`.
#[must_use]
pub fn step_metadata<W>(
    execution: &ScenarioExecution<W>,
    index: usize,
    step: &ResolvedStep<W>,
) -> StepMetadata {
    fn info<W>(scope: &Arc<ScopeNode<W>>) -> ScopeInfo {
        ScopeInfo::from(&**scope)
    }

    StepMetadata {
        feature: execution.feature.as_ref().map(info),
        rule: execution.rule.as_ref().map(info),
        outline: execution.outline.as_ref().map(info),
        scenario: Some(info(&execution.scope)),
        example: execution.example.clone(),
        ..StepMetadata::of_step(index, step)
    }
}

/// Executes the steps of the given `execution` in declaration order against
/// the given `world`, recording the [`ScenarioExecution`] terminal status.
///
/// - A step signaling [`Signal::Pending`] marks the scenario as pending and
///   stops the loop without failing it.
/// - A failing or panicking step marks the scenario as failed and stops the
///   loop.
/// - Otherwise, the scenario is marked as passed.
///
/// # Errors
///
/// With the error of a failing step or of a failing step hook.
pub async fn execute_steps<W, H>(
    execution: &ScenarioExecution<W>,
    world: &SharedWorld<W>,
    hooks: &H,
) -> Result<()>
where
    W: World,
    H: StepHooks<W> + ?Sized,
{
    if execution.pending {
        _ = execution.mark_pending(execution.pending_reason.clone());
        return Ok(());
    }

    let mut runtime = StepRuntime::new();
    for (index, step) in execution.steps.iter().enumerate() {
        let outcome = match hooks.before_step(world, index, step).await {
            Ok(()) => {
                run_step(execution, index, step, world, &mut runtime).await
            }
            Err(e) => Outcome::Failed(e),
        };
        let after = hooks.after_step(world, index, step, outcome.status()).await;

        match outcome {
            Outcome::Passed => {
                if let Err(e) = after {
                    _ = execution.mark_failed(e.clone());
                    return Err(e);
                }
            }
            Outcome::Pending(reason) => {
                tracing::debug!(
                    step = %step.text,
                    reason = reason.as_deref().unwrap_or_default(),
                    "step is pending",
                );
                _ = execution.mark_pending(reason);
                return after;
            }
            Outcome::Failed(e) => {
                _ = execution.mark_failed(e.clone());
                let mut failures = Failures::new();
                failures.push(e);
                _ = failures.record(after);
                return failures.into_result(Phase::Scenario);
            }
        }
    }

    _ = execution.mark_passed();
    Ok(())
}

/// Runs a single `step`, with its data table, docstring and metadata attached
/// to the `runtime` for the duration of the call.
async fn run_step<W>(
    execution: &ScenarioExecution<W>,
    index: usize,
    step: &ResolvedStep<W>,
    world: &SharedWorld<W>,
    runtime: &mut StepRuntime,
) -> Outcome {
    runtime.attach(
        step_metadata(execution, index, step),
        step.table.clone(),
        step.docstring.clone(),
    );
    let res = step
        .definition
        .call(world, step::Context::new(&step.matches, runtime))
        .catch_panic()
        .await;
    runtime.clear();

    match res {
        Ok(Ok(())) => Outcome::Passed,
        Ok(Err(Signal::Pending(p))) => Outcome::Pending(p.into_reason()),
        Ok(Err(Signal::Failed(e))) => Outcome::Failed(Error::handler(e)),
        Err(panic) => Outcome::Failed(panic),
    }
}

/// Runs the given `execution` against the given `world` without any hooks,
/// disposing the `world` resources afterwards.
///
/// The `world` is the [`current_world()`] for the whole run.
///
/// # Errors
///
/// - The error of a failing step or of a failing disposal.
/// - [`Error::Aggregate`] of [`Phase::Scenario`], if both fail.
///
/// [`current_world()`]: crate::world::current_world
pub async fn run_scenario_execution<W: World>(
    execution: &ScenarioExecution<W>,
    world: &SharedWorld<W>,
) -> Result<()> {
    let span = tracing::info_span!(
        "scenario",
        id = %execution.id,
        name = %execution.qualified_name,
    );
    let body = async {
        let mut failures = Failures::new();
        _ = failures.record(execute_steps(execution, world, &NoHooks).await);
        _ = failures.record(dispose_world(&mut *world.lock().await).await);
        failures.into_result(Phase::Scenario)
    };
    with_current_world(world, execution.info(), body)
        .instrument(span)
        .await
}
