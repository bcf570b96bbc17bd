// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Registering a [`TestPlan`] with a host [`Runtime`].

use std::sync::Arc;

use futures::FutureExt as _;

use crate::{
    adapter::Adapter,
    config::Config,
    error::Error,
    execution::ScenarioExecution,
    host::{Runtime, TestBody},
    lifecycle::Lifecycle,
    mode::{resolve_registration, Mode, Variant},
    plan::{FeaturePlan, PlanNode, TestPlan},
    timeout::resolve_timeout,
    world::World,
};

/// Registers every scenario of the given `feature` with the given
/// [`Runtime`].
///
/// Features, rules and scenario outlines become suites, scenarios become
/// tests. Every persistent scope gets its teardown registered as an
/// after-all hook of its suite.
pub fn register_feature_plan<W, A, R>(
    feature: &FeaturePlan<W>,
    adapter: Arc<A>,
    runtime: &mut R,
    config: &Config,
) where
    W: World,
    A: Adapter<W> + 'static,
    R: Runtime,
{
    let lifecycle = Arc::new(Lifecycle::new(adapter, config.clone()));
    register_plan_node(feature, &lifecycle, runtime);
}

/// Registers every feature of the given [`TestPlan`] with the given
/// [`Runtime`], sharing a single [`Lifecycle`].
///
/// Additionally registers an after-all hook tearing down any persistent
/// scope still open.
pub fn register_test_plan<W, A, R>(
    plan: &TestPlan<W>,
    adapter: Arc<A>,
    runtime: &mut R,
    config: &Config,
) where
    W: World,
    A: Adapter<W> + 'static,
    R: Runtime,
{
    let lifecycle = Arc::new(Lifecycle::new(adapter, config.clone()));
    for feature in &plan.features {
        register_plan_node(feature, &lifecycle, runtime);
    }
    runtime.after_all(Box::new(move || {
        async move { lifecycle.teardown_all().await }.boxed()
    }));
}

/// Registers the given [`PlanNode`] and everything nested into it, running
/// its scenarios with the given [`Lifecycle`].
pub fn register_plan_node<W, A, R>(
    node: &PlanNode<W>,
    lifecycle: &Arc<Lifecycle<W, A>>,
    runtime: &mut R,
) where
    W: World,
    A: Adapter<W> + 'static,
    R: Runtime,
{
    if let Some(execution) = &node.execution {
        register_scenario(execution, lifecycle, runtime);
        return;
    }

    let scope = &node.scope;
    runtime.suite(&scope.name, scope.mode.into(), |rt| {
        for child in &node.children {
            register_plan_node(child, lifecycle, rt);
        }
        if scope.kind.is_persistent() {
            let lifecycle = Arc::clone(lifecycle);
            let id = scope.id;
            rt.after_all(Box::new(move || {
                async move { lifecycle.teardown_state(id).await }.boxed()
            }));
        }
    });
}

/// Registers a single scenario `execution`.
fn register_scenario<W, A, R>(
    execution: &Arc<ScenarioExecution<W>>,
    lifecycle: &Arc<Lifecycle<W, A>>,
    runtime: &mut R,
) where
    W: World,
    A: Adapter<W> + 'static,
    R: Runtime,
{
    let config = lifecycle.config();
    let name = execution.name.as_str();

    if !config.accepts(&execution.tags) {
        tracing::debug!(
            scenario = %execution.qualified_name,
            tags = ?execution.tags,
            "scenario filtered out by tags",
        );
        _ = execution.mark_skipped();
        runtime.test(name, Variant::Skip, None, noop());
        return;
    }
    if execution.pending {
        _ = execution.mark_pending(execution.pending_reason.clone());
        let variant = if runtime.supports(Variant::Pending) {
            Variant::Pending
        } else {
            Variant::Skip
        };
        runtime.test(name, variant, None, noop());
        return;
    }
    if execution.mode == Mode::Skip {
        _ = execution.mark_skipped();
        runtime.test(name, Variant::Skip, None, noop());
        return;
    }

    let body: TestBody = {
        let lifecycle = Arc::clone(lifecycle);
        let execution = Arc::clone(execution);
        Box::new(move || {
            async move {
                execution.reset();
                lifecycle.run_scenario(&execution).await
            }
            .boxed()
        })
    };
    let (variant, body) = resolve_registration(
        execution.mode,
        &execution.tags,
        runtime.supports(Variant::Failing),
        body,
    );
    let timeout = resolve_timeout(execution.timeout, config);
    tracing::debug!(
        scenario = %execution.qualified_name,
        %variant,
        timeout_ms = ?timeout.map(|t| t.milliseconds),
        "registering scenario",
    );
    runtime.test(name, variant, timeout, body);
}

/// Body of a test which is never run.
fn noop() -> TestBody {
    Box::new(|| async { Ok::<_, Error>(()) }.boxed())
}
