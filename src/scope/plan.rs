// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Indexed [`ScopePlan`].

use std::{any::Any, collections::HashMap, fmt, sync::Arc};

use super::{
    id::{HookId, ScopeId, StepId},
    node::{ScopeKind, ScopeNode},
};
use crate::{
    error::{Error, Result},
    hook::HookDefinition,
    step::ResolvedStep,
    world::WorldFactory,
};

/// Opaque registry of custom parameter types, provided by the plan builder.
pub type ParameterRegistry = Arc<dyn Any + Send + Sync>;

/// Root [`ScopeNode`] along with lookup maps over the whole tree.
///
/// The engine only reads a [`ScopePlan`], it never modifies one.
pub struct ScopePlan<W> {
    /// Root of the tree.
    root: Arc<ScopeNode<W>>,

    /// All the scopes of the tree, including the root.
    scopes: HashMap<ScopeId, Arc<ScopeNode<W>>>,

    /// Parent of every non-root scope.
    parents: HashMap<ScopeId, ScopeId>,

    /// All the steps of the tree.
    steps: HashMap<StepId, Arc<ResolvedStep<W>>>,

    /// All the hooks of the tree.
    hooks: HashMap<HookId, Arc<HookDefinition<W>>>,

    /// Custom world constructor.
    world_factory: Option<WorldFactory<W>>,

    /// Custom parameter types.
    parameters: Option<ParameterRegistry>,
}

// Implemented manually to omit redundant `W: Debug` trait bound, imposed by
// `#[derive(Debug)]`.
impl<W> fmt::Debug for ScopePlan<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopePlan")
            .field("root", &self.root)
            .field("world_factory", &self.world_factory.is_some())
            .field("parameters", &self.parameters.is_some())
            .finish_non_exhaustive()
    }
}

impl<W> ScopePlan<W> {
    /// Indexes the tree under the given `root`.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidRoot`] if the `root` is not a [`ScopeKind::Root`].
    /// - [`Error::InvalidNesting`] if any scope is nested into a scope that
    ///   cannot contain it.
    pub fn new(root: ScopeNode<W>) -> Result<Self> {
        if root.kind != ScopeKind::Root {
            return Err(Error::InvalidRoot(root.kind));
        }

        let root = Arc::new(root);
        let mut plan = Self {
            root: Arc::clone(&root),
            scopes: HashMap::new(),
            parents: HashMap::new(),
            steps: HashMap::new(),
            hooks: HashMap::new(),
            world_factory: None,
            parameters: None,
        };
        plan.index(&root, None)?;
        Ok(plan)
    }

    /// Indexes the given `node` and all its descendants.
    fn index(
        &mut self,
        node: &Arc<ScopeNode<W>>,
        parent: Option<&ScopeNode<W>>,
    ) -> Result<()> {
        if let Some(parent) = parent {
            if !parent.kind.can_contain(node.kind) {
                return Err(Error::InvalidNesting {
                    parent: parent.kind,
                    child: node.kind,
                    name: node.name.clone(),
                });
            }
            _ = self.parents.insert(node.id, parent.id);
        }

        _ = self.scopes.insert(node.id, Arc::clone(node));
        for step in &node.steps {
            _ = self.steps.insert(step.id, Arc::clone(step));
        }
        for hook in &node.hooks {
            _ = self.hooks.insert(hook.id, Arc::clone(hook));
        }
        for child in &node.children {
            self.index(child, Some(node.as_ref()))?;
        }
        Ok(())
    }

    /// Sets the [`WorldFactory`] used instead of [`World::new()`].
    ///
    /// [`World::new()`]: crate::World::new
    #[must_use]
    pub fn with_world_factory(mut self, factory: WorldFactory<W>) -> Self {
        self.world_factory = Some(factory);
        self
    }

    /// Sets the [`ParameterRegistry`].
    #[must_use]
    pub fn with_parameter_registry(mut self, registry: ParameterRegistry) -> Self {
        self.parameters = Some(registry);
        self
    }

    /// Returns the root [`ScopeNode`].
    #[must_use]
    pub const fn root(&self) -> &Arc<ScopeNode<W>> {
        &self.root
    }

    /// Looks up a [`ScopeNode`] by its ID.
    #[must_use]
    pub fn scope(&self, id: ScopeId) -> Option<&Arc<ScopeNode<W>>> {
        self.scopes.get(&id)
    }

    /// Looks up a [`ResolvedStep`] by its ID.
    #[must_use]
    pub fn step(&self, id: StepId) -> Option<&Arc<ResolvedStep<W>>> {
        self.steps.get(&id)
    }

    /// Looks up a [`HookDefinition`] by its ID.
    #[must_use]
    pub fn hook(&self, id: HookId) -> Option<&Arc<HookDefinition<W>>> {
        self.hooks.get(&id)
    }

    /// Returns the parent of the scope with the given ID.
    #[must_use]
    pub fn parent(&self, id: ScopeId) -> Option<&Arc<ScopeNode<W>>> {
        self.parents.get(&id).and_then(|p| self.scopes.get(p))
    }

    /// Returns the scopes enclosing the one with the given ID, outermost
    /// first, excluding both the root and the scope itself.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownScope`] if there is no such scope in this plan.
    pub fn ancestors(&self, id: ScopeId) -> Result<Vec<Arc<ScopeNode<W>>>> {
        if !self.scopes.contains_key(&id) {
            return Err(Error::UnknownScope(id));
        }

        let mut out = Vec::new();
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            if parent.kind != ScopeKind::Root {
                out.push(Arc::clone(parent));
            }
            current = parent.id;
        }
        out.reverse();
        Ok(out)
    }

    /// Returns all the [`ScopeKind::Scenario`] scopes of the tree in
    /// declaration order.
    #[must_use]
    pub fn scenarios(&self) -> Vec<Arc<ScopeNode<W>>> {
        fn collect<W>(node: &Arc<ScopeNode<W>>, out: &mut Vec<Arc<ScopeNode<W>>>) {
            if node.kind == ScopeKind::Scenario {
                out.push(Arc::clone(node));
            }
            for child in &node.children {
                collect(child, out);
            }
        }

        let mut out = Vec::new();
        collect(&self.root, &mut out);
        out
    }

    /// Returns the custom [`WorldFactory`], if any.
    #[must_use]
    pub const fn world_factory(&self) -> Option<&WorldFactory<W>> {
        self.world_factory.as_ref()
    }

    /// Returns the [`ParameterRegistry`], if any.
    #[must_use]
    pub const fn parameter_registry(&self) -> Option<&ParameterRegistry> {
        self.parameters.as_ref()
    }
}
