// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! [`Adapter`] exposing a [`ScopePlan`] to the execution engine.

use std::{fmt, sync::Arc};

use async_trait::async_trait;
use itertools::Itertools as _;

use crate::{
    error::{Error, Result},
    execution::QUALIFIED_NAME_SEPARATOR,
    hook::HookDefinition,
    scope::{ParameterRegistry, ScopeId, ScopeNode, ScopePlan},
    step::ResolvedStep,
    world::{self, SharedWorld, World},
};

/// Short description of a scenario of a [`ScopePlan`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ScenarioSummary {
    /// ID of the scenario scope.
    pub id: ScopeId,

    /// Name of the scenario.
    pub name: String,

    /// Name of the scenario prefixed with the names of its enclosing scopes.
    pub qualified_name: String,

    /// Tags declared on the scenario itself.
    pub tags: Vec<String>,

    /// IDs of the enclosing scopes, outermost first, the root excluded.
    pub ancestors: Vec<ScopeId>,
}

/// Read access to a built [`ScopePlan`], along with the [`World`]
/// construction.
#[async_trait]
pub trait Adapter<W: World>: Send + Sync {
    /// Returns the underlying [`ScopePlan`].
    fn plan(&self) -> &ScopePlan<W>;

    /// Creates a new [`World`] for the given `scope`, enclosed by a
    /// persistent scope with the given `parent` [`World`].
    ///
    /// # Errors
    ///
    /// If the [`World`] construction fails.
    async fn create_world(
        &self,
        scope: Option<Arc<ScopeNode<W>>>,
        parent: Option<SharedWorld<W>>,
    ) -> Result<W>;

    /// Looks up a scope by its ID.
    fn get_scope(&self, id: ScopeId) -> Option<Arc<ScopeNode<W>>> {
        self.plan().scope(id).cloned()
    }

    /// Returns the steps owned by the scope with the given ID.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownScope`] if there is no such scope.
    fn get_steps(&self, id: ScopeId) -> Result<Vec<Arc<ResolvedStep<W>>>> {
        self.get_scope(id)
            .map(|s| s.steps.clone())
            .ok_or(Error::UnknownScope(id))
    }

    /// Returns the hooks declared on the scope with the given ID.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownScope`] if there is no such scope.
    fn get_hooks(&self, id: ScopeId) -> Result<Vec<Arc<HookDefinition<W>>>> {
        self.get_scope(id)
            .map(|s| s.hooks.clone())
            .ok_or(Error::UnknownScope(id))
    }

    /// Returns the scopes enclosing the one with the given ID, outermost
    /// first, the root excluded.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownScope`] if there is no such scope.
    fn get_ancestors(&self, id: ScopeId) -> Result<Vec<Arc<ScopeNode<W>>>> {
        self.plan().ancestors(id)
    }

    /// Lists all the scenarios of the plan, in declaration order.
    fn list_scenarios(&self) -> Vec<ScenarioSummary> {
        self.plan()
            .scenarios()
            .into_iter()
            .filter_map(|s| {
                let ancestors = self.get_ancestors(s.id).ok()?;
                Some(ScenarioSummary {
                    id: s.id,
                    name: s.name.clone(),
                    qualified_name: ancestors
                        .iter()
                        .map(|a| a.name.as_str())
                        .chain(Some(s.name.as_str()))
                        .filter(|n| !n.is_empty())
                        .join(QUALIFIED_NAME_SEPARATOR),
                    tags: s.tags.clone(),
                    ancestors: ancestors.iter().map(|a| a.id).collect(),
                })
            })
            .collect()
    }

    /// Returns the parameter types registry of the plan, if any.
    fn parameter_registry(&self) -> Option<&ParameterRegistry> {
        self.plan().parameter_registry()
    }
}

/// [`Adapter`] over an owned [`ScopePlan`].
///
/// Creates [`World`]s with the plan's [`WorldFactory`], if any, or with
/// [`World::new()`] otherwise.
///
/// [`WorldFactory`]: crate::WorldFactory
pub struct PlanAdapter<W> {
    plan: ScopePlan<W>,
}

// Implemented manually to omit redundant `W: Debug` trait bound, imposed by
// `#[derive(Debug)]`.
impl<W> fmt::Debug for PlanAdapter<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlanAdapter").field("plan", &self.plan).finish()
    }
}

impl<W> PlanAdapter<W> {
    /// Wraps the given [`ScopePlan`].
    #[must_use]
    pub const fn new(plan: ScopePlan<W>) -> Self {
        Self { plan }
    }
}

impl<W> From<ScopePlan<W>> for PlanAdapter<W> {
    fn from(plan: ScopePlan<W>) -> Self {
        Self::new(plan)
    }
}

#[async_trait]
impl<W: World> Adapter<W> for PlanAdapter<W> {
    fn plan(&self) -> &ScopePlan<W> {
        &self.plan
    }

    async fn create_world(
        &self,
        scope: Option<Arc<ScopeNode<W>>>,
        parent: Option<SharedWorld<W>>,
    ) -> Result<W> {
        if let Some(s) = &scope {
            tracing::debug!(
                scope = %s.name,
                kind = %s.kind,
                inherits = parent.is_some(),
                "creating world",
            );
        }
        world::create_world(self.plan.world_factory(), scope, parent).await
    }
}

/// Returns the nearest persistent scope among the given `ancestors`
/// (outermost first).
pub(crate) fn nearest_persistent<W>(
    ancestors: &[Arc<ScopeNode<W>>],
) -> Option<&Arc<ScopeNode<W>>> {
    ancestors.iter().rev().find(|s| s.kind.is_persistent())
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use futures::executor::block_on;

    use super::*;

    #[derive(Debug, Default)]
    struct Counter(u32);

    impl World for Counter {
        type Error = Infallible;

        async fn new() -> Result<Self, Infallible> {
            Ok(Self(7))
        }
    }

    fn adapter() -> (PlanAdapter<Counter>, ScopeId) {
        let scenario = ScopeNode::scenario("count").with_tags(["@fast"]);
        let id = scenario.id;
        let root = ScopeNode::root().with_child(
            ScopeNode::feature("Counting")
                .with_child(ScopeNode::rule("Up").with_child(scenario)),
        );
        (ScopePlan::new(root).unwrap().into(), id)
    }

    #[test]
    fn lists_scenarios() {
        let (adapter, id) = adapter();

        let list = adapter.list_scenarios();

        assert_eq!(list.len(), 1);
        assert_eq!(list[0].id, id);
        assert_eq!(list[0].qualified_name, "Counting > Up > count");
        assert_eq!(list[0].tags, ["@fast"]);
        assert_eq!(list[0].ancestors.len(), 2);
    }

    #[test]
    fn looks_up_scopes() {
        let (adapter, id) = adapter();

        assert_eq!(adapter.get_scope(id).unwrap().name, "count");
        assert!(adapter.get_steps(id).unwrap().is_empty());
        assert!(adapter.get_hooks(id).unwrap().is_empty());
        assert!(matches!(
            adapter.get_steps(ScopeId(u64::MAX)),
            Err(Error::UnknownScope(_)),
        ));
        assert!(adapter.parameter_registry().is_none());
    }

    #[test]
    fn finds_nearest_persistent_ancestor() {
        let (adapter, id) = adapter();

        let ancestors = adapter.get_ancestors(id).unwrap();
        let nearest = nearest_persistent(&ancestors).unwrap();

        assert_eq!(nearest.name, "Up");
        assert!(nearest_persistent::<Counter>(&[]).is_none());
    }

    #[test]
    fn creates_worlds_with_new() {
        let (adapter, _) = adapter();

        let world = block_on(adapter.create_world(None, None)).unwrap();

        assert_eq!(world.0, 7);
    }
}
