// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Nodes of a static scope tree.

use std::{fmt, sync::Arc};

use derive_more::with_trait::Display;
use itertools::Itertools as _;
use linked_hash_map::LinkedHashMap;

use super::id::ScopeId;
use crate::{
    hook::HookDefinition,
    mode::Mode,
    step::{Location, ResolvedStep},
    tag,
    timeout::TimeoutSpec,
};

/// Kind of a [`ScopeNode`].
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum ScopeKind {
    /// Root of a scope tree, owning global hooks.
    #[display("root")]
    Root,

    /// [Feature](https://cucumber.io/docs/gherkin/reference#feature).
    #[display("feature")]
    Feature,

    /// [Rule](https://cucumber.io/docs/gherkin/reference#rule).
    #[display("rule")]
    Rule,

    /// [Scenario](https://cucumber.io/docs/gherkin/reference#scenario), or a
    /// single example of a [`ScopeKind::ScenarioOutline`].
    #[display("scenario")]
    Scenario,

    /// [Scenario Outline][0].
    ///
    /// [0]: https://cucumber.io/docs/gherkin/reference#scenario-outline
    #[display("scenarioOutline")]
    ScenarioOutline,
}

impl ScopeKind {
    /// Indicates whether a world of this scope is shared by every scenario
    /// nested under it.
    #[must_use]
    pub const fn is_persistent(self) -> bool {
        matches!(self, Self::Feature | Self::Rule | Self::ScenarioOutline)
    }

    /// Indicates whether a scope of this kind may directly contain a `child`
    /// one.
    #[must_use]
    pub const fn can_contain(self, child: Self) -> bool {
        matches!(
            (self, child),
            (Self::Root, Self::Feature)
                | (
                    Self::Feature,
                    Self::Rule | Self::Scenario | Self::ScenarioOutline,
                )
                | (Self::Rule, Self::Scenario | Self::ScenarioOutline)
                | (Self::ScenarioOutline, Self::Scenario),
        )
    }
}

/// Row of a [Scenario Outline][0] examples table, bound to the scenario
/// generated from it.
///
/// [0]: https://cucumber.io/docs/gherkin/reference#scenario-outline
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Example {
    /// Zero-based index of the row among all the examples of the outline.
    pub index: usize,

    /// Name of the examples table this row belongs to.
    pub name: Option<String>,

    /// Header to value mapping of the row.
    pub values: LinkedHashMap<String, String>,
}

impl Example {
    /// Creates a new [`Example`] out of `(header, value)` pairs.
    #[must_use]
    pub fn new<K, V>(index: usize, values: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            index,
            name: None,
            values: values
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Node of a static scope tree.
///
/// Built once, before any execution, and never mutated afterwards.
pub struct ScopeNode<W> {
    /// Unique ID of this scope.
    pub id: ScopeId,

    /// Kind of this scope.
    pub kind: ScopeKind,

    /// Display name of this scope.
    pub name: String,

    /// Declared execution [`Mode`].
    pub mode: Mode,

    /// Tags declared on this scope itself.
    pub tags: Vec<String>,

    /// Declared timeout.
    pub timeout: Option<TimeoutSpec>,

    /// Indicates whether this scope is marked as pending.
    pub pending: bool,

    /// Reason of this scope being pending.
    pub pending_reason: Option<String>,

    /// Steps owned by this scope, in declaration order.
    ///
    /// Steps of a feature or a rule are its background.
    pub steps: Vec<Arc<ResolvedStep<W>>>,

    /// Hooks declared on this scope, in declaration order.
    pub hooks: Vec<Arc<HookDefinition<W>>>,

    /// Nested scopes, in declaration order.
    pub children: Vec<Arc<ScopeNode<W>>>,

    /// Location of this scope in its source.
    pub location: Option<Location>,

    /// Examples row, if this scenario was generated from an outline.
    pub example: Option<Example>,
}

// Implemented manually to omit redundant `W: Debug` trait bound, and to avoid
// an infinitely recursive one for `children`.
impl<W> fmt::Debug for ScopeNode<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopeNode")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("name", &self.name)
            .field("mode", &self.mode)
            .field("tags", &self.tags)
            .field("timeout", &self.timeout)
            .field("pending", &self.pending)
            .field("steps", &self.steps)
            .field("hooks", &self.hooks)
            .field("children", &self.children)
            .finish_non_exhaustive()
    }
}

impl<W> ScopeNode<W> {
    /// Creates a new empty [`ScopeNode`] of the given `kind`.
    #[must_use]
    pub fn new(kind: ScopeKind, name: impl Into<String>) -> Self {
        Self {
            id: ScopeId::new(),
            kind,
            name: name.into(),
            mode: Mode::Default,
            tags: Vec::new(),
            timeout: None,
            pending: false,
            pending_reason: None,
            steps: Vec::new(),
            hooks: Vec::new(),
            children: Vec::new(),
            location: None,
            example: None,
        }
    }

    /// Creates a new [`ScopeKind::Root`] node.
    #[must_use]
    pub fn root() -> Self {
        Self::new(ScopeKind::Root, "")
    }

    /// Creates a new [`ScopeKind::Feature`] node.
    #[must_use]
    pub fn feature(name: impl Into<String>) -> Self {
        Self::new(ScopeKind::Feature, name)
    }

    /// Creates a new [`ScopeKind::Rule`] node.
    #[must_use]
    pub fn rule(name: impl Into<String>) -> Self {
        Self::new(ScopeKind::Rule, name)
    }

    /// Creates a new [`ScopeKind::Scenario`] node.
    #[must_use]
    pub fn scenario(name: impl Into<String>) -> Self {
        Self::new(ScopeKind::Scenario, name)
    }

    /// Creates a new [`ScopeKind::ScenarioOutline`] node.
    #[must_use]
    pub fn outline(name: impl Into<String>) -> Self {
        Self::new(ScopeKind::ScenarioOutline, name)
    }

    /// Sets the declared [`Mode`].
    #[must_use]
    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    /// Adds tags to this scope.
    #[must_use]
    pub fn with_tags<T: Into<String>>(
        mut self,
        tags: impl IntoIterator<Item = T>,
    ) -> Self {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Sets the declared timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: impl Into<TimeoutSpec>) -> Self {
        self.timeout = Some(timeout.into());
        self
    }

    /// Marks this scope as pending.
    #[must_use]
    pub fn pending(mut self) -> Self {
        self.pending = true;
        self
    }

    /// Marks this scope as pending for the given `reason`.
    #[must_use]
    pub fn pending_because(mut self, reason: impl Into<String>) -> Self {
        self.pending = true;
        self.pending_reason = Some(reason.into());
        self
    }

    /// Appends a step owned by this scope.
    #[must_use]
    pub fn with_step(mut self, step: ResolvedStep<W>) -> Self {
        self.steps.push(Arc::new(step));
        self
    }

    /// Appends a hook declared on this scope.
    #[must_use]
    pub fn with_hook(mut self, hook: HookDefinition<W>) -> Self {
        self.hooks.push(Arc::new(hook));
        self
    }

    /// Appends a nested scope.
    #[must_use]
    pub fn with_child(mut self, child: Self) -> Self {
        self.children.push(Arc::new(child));
        self
    }

    /// Sets the source [`Location`].
    #[must_use]
    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    /// Binds an outline [`Example`] to this scenario.
    #[must_use]
    pub fn with_example(mut self, example: Example) -> Self {
        self.example = Some(example);
        self
    }
}

/// Collects the tags of the given scope `chain` (outermost first), dropping
/// the ones repeated by nested scopes.
#[must_use]
pub fn inherited_tags<'a, W: 'a>(
    chain: impl IntoIterator<Item = &'a Arc<ScopeNode<W>>>,
) -> Vec<String> {
    chain
        .into_iter()
        .flat_map(|s| &s.tags)
        .unique_by(|t| tag::normalize(t).to_owned())
        .cloned()
        .collect()
}
