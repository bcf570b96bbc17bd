// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Ordering and sequential invocation of [`ResolvedHook`]s.

use std::cmp::Ordering;

use crate::{
    config::Config,
    error::Result,
    future::guard,
    hook::{self, HookMetadata, HookPhase, ResolvedHook},
    timeout::{resolve_hook_timeout, TimeoutSpec},
    world::SharedWorld,
};

/// Compares two hooks in their [`HookPhase::Before`] order.
///
/// Lower explicit order goes first, then the more deeply nested scope, then
/// the lower scope and hook IDs.
#[must_use]
pub fn compare<W>(a: &ResolvedHook<W>, b: &ResolvedHook<W>) -> Ordering {
    a.hook
        .order()
        .cmp(&b.hook.order())
        .then_with(|| b.depth.cmp(&a.depth))
        .then_with(|| (a.scope.id, a.hook.id).cmp(&(b.scope.id, b.hook.id)))
}

/// Orders the given `hooks` for the given [`HookPhase`].
///
/// [`HookPhase::After`] order is the exact reverse of the
/// [`HookPhase::Before`] one.
#[must_use]
pub fn order_hooks<W>(
    hooks: &[ResolvedHook<W>],
    phase: HookPhase,
) -> Vec<ResolvedHook<W>> {
    let mut out = hooks.to_vec();
    out.sort_by(compare);
    if phase == HookPhase::After {
        out.reverse();
    }
    out
}

/// Everything a chain of hooks is invoked with, but the world.
#[derive(Debug)]
pub struct Invocation<'a> {
    /// Tags of the target, hooks are filtered by.
    pub tags: &'a [String],

    /// [`HookMetadata`] passed to every hook.
    pub meta: HookMetadata,

    /// Timeout of the target, hooks without their own one inherit.
    pub timeout: Option<TimeoutSpec>,

    /// [`Config`] of the run.
    pub config: &'a Config,
}

/// Invokes the given (already ordered) `hooks` one by one, skipping the ones
/// not applying to the [`Invocation::tags`].
///
/// # Errors
///
/// With the first hook failing or panicking. The remaining hooks are not
/// invoked then.
pub async fn invoke_hooks<W>(
    hooks: &[ResolvedHook<W>],
    world: &SharedWorld<W>,
    inv: &Invocation<'_>,
) -> Result<()> {
    for resolved in hooks {
        let hook = &resolved.hook;
        if !hook.applies_to(inv.tags) {
            tracing::debug!(hook = %hook.id, ty = %hook.ty, "hook skipped");
            continue;
        }

        tracing::debug!(
            hook = %hook.id,
            ty = %hook.ty,
            scope = %resolved.scope.name,
            order = hook.order(),
            timeout_ms = ?resolve_hook_timeout(
                hook.options.timeout,
                inv.timeout,
                inv.config,
            )
            .map(|t| t.milliseconds),
            "running hook",
        );
        let ctx = hook::Context {
            world,
            scope: &resolved.scope,
            meta: inv.meta.clone(),
            data: hook.options.data.as_ref(),
            logger: inv.config.logger.clone(),
        };
        if let Err(e) = guard(hook.call(ctx)).await {
            tracing::debug!(hook = %hook.id, error = %e, "hook failed");
            return Err(e);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use futures::{executor::block_on, lock, FutureExt as _};

    use super::*;
    use crate::{
        error::BoxError,
        hook::{HookCollection, HookDefinition, HookType},
        scope::ScopeNode,
    };

    type Log = Arc<Mutex<Vec<&'static str>>>;

    fn hook(log: &Log, name: &'static str) -> HookDefinition<()> {
        let log = Arc::clone(log);
        HookDefinition::new(HookType::BeforeScenario, move |_| {
            log.lock().unwrap().push(name);
            async { Ok(()) }.boxed()
        })
    }

    fn names(hooks: &[ResolvedHook<()>]) -> Vec<&str> {
        hooks
            .iter()
            .map(|h| h.hook.description.as_deref().unwrap_or_default())
            .collect()
    }

    fn named(h: HookDefinition<()>, name: &str) -> HookDefinition<()> {
        h.with_description(name)
    }

    fn collection(log: &Log) -> HookCollection<()> {
        let root = Arc::new(
            ScopeNode::root()
                .with_hook(named(hook(log, "root"), "root"))
                .with_hook(named(hook(log, "root-1").with_order(1), "root-1")),
        );
        let feature = Arc::new(
            ScopeNode::feature("f")
                .with_hook(named(hook(log, "feature"), "feature"))
                .with_hook(named(hook(log, "feature-9").with_order(9), "feature-9")),
        );
        let scenario = Arc::new(
            ScopeNode::scenario("s")
                .with_hook(named(hook(log, "scenario"), "scenario")),
        );
        HookCollection::collect(&[root, feature, scenario])
    }

    #[test]
    fn before_order() {
        let log = Log::default();
        let hooks = collection(&log);

        let ordered =
            order_hooks(hooks.get(HookType::BeforeScenario), HookPhase::Before);

        assert_eq!(
            names(&ordered),
            ["root-1", "scenario", "feature", "root", "feature-9"],
        );
    }

    #[test]
    fn after_order_is_reversed() {
        let log = Log::default();
        let hooks = collection(&log);

        let ordered =
            order_hooks(hooks.get(HookType::BeforeScenario), HookPhase::After);

        assert_eq!(
            names(&ordered),
            ["feature-9", "root", "feature", "scenario", "root-1"],
        );
    }

    #[test]
    fn ties_are_broken_by_identity() {
        let log = Log::default();
        let scope = Arc::new(
            ScopeNode::scenario("s")
                .with_hook(named(hook(&log, "a"), "a"))
                .with_hook(named(hook(&log, "b"), "b")),
        );
        let hooks = HookCollection::collect(&[scope]);

        let ordered =
            order_hooks(hooks.get(HookType::BeforeScenario), HookPhase::Before);

        assert_eq!(names(&ordered), ["a", "b"]);
        assert_eq!(compare(&ordered[0], &ordered[0]), Ordering::Equal);
    }

    #[test]
    fn invokes_sequentially_and_stops_on_failure() {
        let log = Log::default();
        let failing = {
            let log = Arc::clone(&log);
            HookDefinition::<()>::new(HookType::BeforeScenario, move |_| {
                log.lock().unwrap().push("failing");
                async { Err(BoxError::from("broken")) }.boxed()
            })
            .with_order(2)
        };
        let tagged = hook(&log, "tagged").with_order(1).with_tags("@db").unwrap();
        let scope = Arc::new(
            ScopeNode::scenario("s")
                .with_hook(hook(&log, "first").with_order(0))
                .with_hook(tagged)
                .with_hook(failing)
                .with_hook(hook(&log, "never").with_order(3)),
        );
        let hooks = HookCollection::collect(&[Arc::clone(&scope)]);
        let ordered =
            order_hooks(hooks.get(HookType::BeforeScenario), HookPhase::Before);

        let config = Config::default();
        let inv = Invocation {
            tags: &[],
            meta: HookMetadata::new(&*scope),
            timeout: None,
            config: &config,
        };
        let world = Arc::new(lock::Mutex::new(()));
        let err = block_on(invoke_hooks(&ordered, &world, &inv)).unwrap_err();

        assert_eq!(err.to_string(), "broken");
        assert_eq!(*log.lock().unwrap(), ["first", "failing"]);
    }
}
