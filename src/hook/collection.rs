// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Collecting the hooks of a scope chain.

use std::{fmt, sync::Arc};

use super::definition::{HookDefinition, HookType};
use crate::scope::ScopeNode;

/// [`HookDefinition`] paired with the [`ScopeNode`] it's declared on.
pub struct ResolvedHook<W> {
    /// Hook itself.
    pub hook: Arc<HookDefinition<W>>,

    /// Scope the hook is declared on.
    pub scope: Arc<ScopeNode<W>>,

    /// Nesting depth of the `scope`, the root being `0`.
    pub depth: usize,
}

// Implemented manually to omit redundant `W: Clone` trait bound, imposed by
// `#[derive(Clone)]`.
impl<W> Clone for ResolvedHook<W> {
    fn clone(&self) -> Self {
        Self {
            hook: Arc::clone(&self.hook),
            scope: Arc::clone(&self.scope),
            depth: self.depth,
        }
    }
}

// Implemented manually to omit redundant `W: Debug` trait bound, imposed by
// `#[derive(Debug)]`.
impl<W> fmt::Debug for ResolvedHook<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedHook")
            .field("hook", &self.hook.id)
            .field("ty", &self.hook.ty)
            .field("scope", &self.scope.id)
            .field("depth", &self.depth)
            .finish()
    }
}

/// Hooks of a scope chain, bucketed by their [`HookType`].
///
/// Within a bucket, hooks keep the scope chain order (root first), and the
/// declaration order within a scope. No other ordering is applied.
pub struct HookCollection<W> {
    buckets: [Vec<ResolvedHook<W>>; 10],
}

// Implemented manually to omit redundant `W: Debug` trait bound, imposed by
// `#[derive(Debug)]`.
impl<W> fmt::Debug for HookCollection<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(
                HookType::ALL
                    .iter()
                    .zip(&self.buckets)
                    .filter(|(_, b)| !b.is_empty()),
            )
            .finish()
    }
}

// Implemented manually to omit redundant `W: Default` trait bound, imposed
// by `#[derive(Default)]`.
impl<W> Default for HookCollection<W> {
    fn default() -> Self {
        Self { buckets: Default::default() }
    }
}

impl<W> HookCollection<W> {
    /// Collects the hooks of every scope in the given `chain`, which goes from
    /// the root to the target scope.
    #[must_use]
    pub fn collect(chain: &[Arc<ScopeNode<W>>]) -> Self {
        let mut out = Self::default();
        for (depth, scope) in chain.iter().enumerate() {
            for hook in &scope.hooks {
                out.buckets[hook.ty.index()].push(ResolvedHook {
                    hook: Arc::clone(hook),
                    scope: Arc::clone(scope),
                    depth,
                });
            }
        }
        out
    }

    /// Returns the hooks of the given [`HookType`].
    #[must_use]
    pub fn get(&self, ty: HookType) -> &[ResolvedHook<W>] {
        &self.buckets[ty.index()]
    }

    /// Returns the total number of collected hooks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buckets.iter().map(Vec::len).sum()
    }

    /// Indicates whether no hooks were collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buckets.iter().all(Vec::is_empty)
    }
}
