// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Worlds of persistent scopes: features, rules and scenario outlines.

use std::{collections::HashMap, fmt, iter, sync::Arc};

use futures::lock::Mutex;

use super::{
    ordering::{invoke_hooks, order_hooks, Invocation},
    Lifecycle,
};
use crate::{
    adapter::{nearest_persistent, Adapter},
    error::{Error, Failures, Phase, Result},
    execution::ScenarioExecution,
    hook::{HookCollection, HookMetadata, HookPhase, HookType},
    scope::{inherited_tags, ScopeId, ScopeNode},
    world::{dispose_world, SharedWorld, World},
};

/// Materialized persistent scope.
pub(super) struct ScopeState<W> {
    /// Scope itself.
    scope: Arc<ScopeNode<W>>,

    /// Scope chain from the root to the scope itself.
    chain: Vec<Arc<ScopeNode<W>>>,

    /// [`World`] shared by every scenario nested under the scope.
    world: SharedWorld<W>,

    /// Result of the scope's before hooks, once they've run.
    before: Option<Result<()>>,
}

impl<W> ScopeState<W> {
    /// Indicates whether the scope with the given ID is this one or encloses
    /// it.
    fn within(&self, id: ScopeId) -> bool {
        self.chain.iter().any(|s| s.id == id)
    }
}

// Implemented manually to omit redundant `W: Debug` trait bound, imposed by
// `#[derive(Debug)]`.
impl<W> fmt::Debug for ScopeState<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopeState")
            .field("scope", &self.scope.id)
            .field("before", &self.before)
            .finish_non_exhaustive()
    }
}

/// Open persistent scopes by their IDs.
pub(super) type States<W> = HashMap<ScopeId, ScopeState<W>>;

impl<W: World, A: Adapter<W>> Lifecycle<W, A> {
    /// Ensures the persistent scope with the given ID, and every persistent
    /// scope enclosing it, is materialized: has its [`World`] created and its
    /// before hooks run once.
    ///
    /// A failure of the before hooks is remembered and returned on every
    /// subsequent call, until the scope is torn down.
    ///
    /// # Errors
    ///
    /// - [`Error::UnknownScope`] if there is no such scope.
    /// - [`Error::NotPersistent`] if the scope doesn't share its [`World`].
    /// - If the [`World`] creation or any before hook fails.
    pub async fn ensure_state(&self, id: ScopeId) -> Result<SharedWorld<W>> {
        let scope = self.adapter.get_scope(id).ok_or(Error::UnknownScope(id))?;
        if !scope.kind.is_persistent() {
            return Err(Error::NotPersistent { id, kind: scope.kind });
        }
        let ancestors = self.adapter.get_ancestors(id)?;

        let mut states = self.states.lock().await;
        let mut chain = vec![Arc::clone(self.adapter.plan().root())];
        let mut world = None;
        for s in ancestors.into_iter().chain(iter::once(scope)) {
            chain.push(Arc::clone(&s));
            if s.kind.is_persistent() {
                world = Some(
                    self.materialize(&mut states, &s, &chain, world.take())
                        .await?,
                );
            }
        }
        world.ok_or(Error::UnknownScope(id))
    }

    /// Materializes the given `scope` ending the given `chain`, unless it's
    /// open already, and runs its before hooks once.
    async fn materialize(
        &self,
        states: &mut States<W>,
        scope: &Arc<ScopeNode<W>>,
        chain: &[Arc<ScopeNode<W>>],
        parent: Option<SharedWorld<W>>,
    ) -> Result<SharedWorld<W>> {
        if !states.contains_key(&scope.id) {
            let world = self
                .adapter
                .create_world(Some(Arc::clone(scope)), parent)
                .await?;
            tracing::debug!(scope = %scope.name, kind = %scope.kind, "scope opened");
            _ = states.insert(
                scope.id,
                ScopeState {
                    scope: Arc::clone(scope),
                    chain: chain.to_vec(),
                    world: Arc::new(Mutex::new(world)),
                    before: None,
                },
            );
        }

        let state =
            states.get_mut(&scope.id).ok_or(Error::UnknownScope(scope.id))?;
        if state.before.is_none() {
            let res = self.run_scope_hooks(state, HookPhase::Before).await;
            state.before = Some(res);
        }
        match &state.before {
            Some(Err(e)) => Err(e.clone()),
            _ => Ok(Arc::clone(&state.world)),
        }
    }

    /// Runs the hooks of the given [`HookPhase`] targeting the scope of the
    /// given `state`.
    async fn run_scope_hooks(
        &self,
        state: &ScopeState<W>,
        phase: HookPhase,
    ) -> Result<()> {
        let scope = &state.scope;
        let Some(ty) = HookType::of(phase, scope.kind) else {
            return Ok(());
        };
        let hooks = order_hooks(HookCollection::collect(&state.chain).get(ty), phase);
        if hooks.is_empty() {
            return Ok(());
        }

        let tags = inherited_tags(&state.chain);
        let inv = Invocation {
            tags: &tags,
            meta: HookMetadata::new(&**scope),
            timeout: state.chain.iter().rev().find_map(|s| s.timeout),
            config: &self.config,
        };
        invoke_hooks(&hooks, &state.world, &inv).await
    }

    /// Tears down the persistent scope with the given ID, along with every
    /// open scope nested under it, the most deeply nested first.
    ///
    /// Every scope gets its after hooks run and its [`World`] disposed exactly
    /// once. Tearing down a scope that isn't open is a no-op.
    ///
    /// # Errors
    ///
    /// - The error of a failing after hook or disposal.
    /// - [`Error::Aggregate`] of [`Phase::Teardown`], if several fail.
    pub async fn teardown_state(&self, id: ScopeId) -> Result<()> {
        let mut states = self.states.lock().await;
        let ids = deepest_first(&states, |s| s.within(id));
        self.close_all(&mut states, ids).await
    }

    /// Tears down every open persistent scope, the most deeply nested first.
    ///
    /// # Errors
    ///
    /// - The error of a failing after hook or disposal.
    /// - [`Error::Aggregate`] of [`Phase::Teardown`], if several fail.
    pub async fn teardown_all(&self) -> Result<()> {
        let mut states = self.states.lock().await;
        let ids = deepest_first(&states, |_| true);
        self.close_all(&mut states, ids).await
    }

    /// Returns the IDs of the open persistent scopes.
    pub async fn open_scopes(&self) -> Vec<ScopeId> {
        let mut ids = self.states.lock().await.keys().copied().collect::<Vec<_>>();
        ids.sort();
        ids
    }

    /// Closes the scopes with the given IDs in order.
    async fn close_all(
        &self,
        states: &mut States<W>,
        ids: Vec<ScopeId>,
    ) -> Result<()> {
        let mut failures = Failures::new();
        for id in ids {
            if let Some(state) = states.remove(&id) {
                _ = failures.record(self.close(state).await);
            }
        }
        failures.into_result(Phase::Teardown)
    }

    /// Runs the after hooks of the given `state` and disposes its [`World`].
    async fn close(&self, state: ScopeState<W>) -> Result<()> {
        let mut failures = Failures::new();
        _ = failures.record(self.run_scope_hooks(&state, HookPhase::After).await);
        _ = failures.record(dispose_world(&mut *state.world.lock().await).await);
        tracing::debug!(
            scope = %state.scope.name,
            kind = %state.scope.kind,
            "scope closed",
        );
        failures.into_result(Phase::Teardown)
    }

    /// Resolves the [`World`] of the nearest persistent scope enclosing the
    /// given `execution`, materializing it if needed.
    ///
    /// # Errors
    ///
    /// If materializing fails.
    pub async fn parent_world(
        &self,
        execution: &ScenarioExecution<W>,
    ) -> Result<Option<SharedWorld<W>>> {
        match nearest_persistent(&execution.ancestors) {
            Some(scope) => self.ensure_state(scope.id).await.map(Some),
            None => Ok(None),
        }
    }
}

/// Returns the IDs of the open scopes matching the given `filter`, the most
/// deeply nested first.
fn deepest_first<W>(
    states: &States<W>,
    filter: impl Fn(&ScopeState<W>) -> bool,
) -> Vec<ScopeId> {
    let mut ids = states
        .iter()
        .filter(|(_, s)| filter(s))
        .map(|(id, s)| (s.chain.len(), *id))
        .collect::<Vec<_>>();
    ids.sort_by(|a, b| b.cmp(a));
    ids.into_iter().map(|(_, id)| id).collect()
}
