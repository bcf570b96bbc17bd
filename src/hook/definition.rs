// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! [`HookDefinition`]s and their [`HookType`]s.

use std::{any::Any, fmt, sync::Arc};

use derive_more::with_trait::Display;
use futures::future::BoxFuture;

use super::context::Context;
use crate::{
    error::{BoxError, ConfigError},
    mode::Mode,
    scope::{HookId, ScopeKind},
    tag::TagFilter,
    timeout::TimeoutSpec,
};

/// Order of a hook declared without an explicit one.
///
/// Hooks with a lower explicit order preempt the ones without it.
pub const DEFAULT_ORDER: i32 = 5;

/// Phase of a [`HookType`].
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
#[display("{self:?}")]
pub enum HookPhase {
    /// Executed before the target.
    Before,

    /// Executed after the target.
    After,
}

/// Type of a hook: its [`HookPhase`] and its target.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[display("{self:?}")]
pub enum HookType {
    /// Before a feature's first scenario.
    BeforeFeature,

    /// After a feature's last scenario.
    AfterFeature,

    /// Before a rule's first scenario.
    BeforeRule,

    /// After a rule's last scenario.
    AfterRule,

    /// Before every scenario.
    BeforeScenario,

    /// After every scenario.
    AfterScenario,

    /// Before a scenario outline's first example.
    BeforeScenarioOutline,

    /// After a scenario outline's last example.
    AfterScenarioOutline,

    /// Before every step.
    BeforeStep,

    /// After every step.
    AfterStep,
}

impl HookType {
    /// All the [`HookType`]s.
    pub const ALL: [Self; 10] = [
        Self::BeforeFeature,
        Self::AfterFeature,
        Self::BeforeRule,
        Self::AfterRule,
        Self::BeforeScenario,
        Self::AfterScenario,
        Self::BeforeScenarioOutline,
        Self::AfterScenarioOutline,
        Self::BeforeStep,
        Self::AfterStep,
    ];

    /// Returns the [`HookPhase`] of this [`HookType`].
    #[must_use]
    pub const fn phase(self) -> HookPhase {
        match self {
            Self::BeforeFeature
            | Self::BeforeRule
            | Self::BeforeScenario
            | Self::BeforeScenarioOutline
            | Self::BeforeStep => HookPhase::Before,
            Self::AfterFeature
            | Self::AfterRule
            | Self::AfterScenario
            | Self::AfterScenarioOutline
            | Self::AfterStep => HookPhase::After,
        }
    }

    /// Returns the [`ScopeKind`] this [`HookType`] targets, or [`None`] for
    /// step hooks.
    #[must_use]
    pub const fn target(self) -> Option<ScopeKind> {
        match self {
            Self::BeforeFeature | Self::AfterFeature => Some(ScopeKind::Feature),
            Self::BeforeRule | Self::AfterRule => Some(ScopeKind::Rule),
            Self::BeforeScenario | Self::AfterScenario => {
                Some(ScopeKind::Scenario)
            }
            Self::BeforeScenarioOutline | Self::AfterScenarioOutline => {
                Some(ScopeKind::ScenarioOutline)
            }
            Self::BeforeStep | Self::AfterStep => None,
        }
    }

    /// Returns the [`HookType`] of the given `phase` targeting the given
    /// [`ScopeKind`], if hooks may target it at all.
    #[must_use]
    pub const fn of(phase: HookPhase, kind: ScopeKind) -> Option<Self> {
        use HookPhase as P;
        use ScopeKind as K;

        Some(match (phase, kind) {
            (P::Before, K::Feature) => Self::BeforeFeature,
            (P::After, K::Feature) => Self::AfterFeature,
            (P::Before, K::Rule) => Self::BeforeRule,
            (P::After, K::Rule) => Self::AfterRule,
            (P::Before, K::Scenario) => Self::BeforeScenario,
            (P::After, K::Scenario) => Self::AfterScenario,
            (P::Before, K::ScenarioOutline) => Self::BeforeScenarioOutline,
            (P::After, K::ScenarioOutline) => Self::AfterScenarioOutline,
            (_, K::Root) => return None,
        })
    }

    /// Returns the position of this [`HookType`] in [`HookType::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Opaque data attached to a hook.
pub type HookData = Arc<dyn Any + Send + Sync>;

/// Options of a [`HookDefinition`].
#[derive(Clone, Default)]
pub struct HookOptions {
    /// [`TagFilter`] the target's tags must match for the hook to run.
    pub tags: Option<TagFilter>,

    /// Timeout of the hook.
    pub timeout: Option<TimeoutSpec>,

    /// Explicit order of the hook, [`DEFAULT_ORDER`] if [`None`].
    pub order: Option<i32>,

    /// [`Mode`] of the hook. [`Mode::Skip`] disables it.
    pub mode: Mode,

    /// Opaque data made available to the handler.
    pub data: Option<HookData>,
}

// Implemented manually, as `HookData` doesn't implement `Debug`.
impl fmt::Debug for HookOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookOptions")
            .field("tags", &self.tags)
            .field("timeout", &self.timeout)
            .field("order", &self.order)
            .field("mode", &self.mode)
            .field("data", &self.data.as_ref().map(|_| ".."))
            .finish()
    }
}

/// Handler of a [`HookDefinition`].
pub type HookFn<W> = Arc<
    dyn for<'a> Fn(Context<'a, W>) -> BoxFuture<'a, Result<(), BoxError>>
        + Send
        + Sync,
>;

/// Lifecycle callback declared on a scope.
pub struct HookDefinition<W> {
    /// Unique ID of this hook.
    pub id: HookId,

    /// [`HookType`] of this hook.
    pub ty: HookType,

    /// [`HookOptions`] of this hook.
    pub options: HookOptions,

    /// Human-readable description.
    pub description: Option<String>,

    /// Handler of this hook.
    handler: HookFn<W>,
}

// Implemented manually to omit redundant `W: Debug` trait bound, imposed by
// `#[derive(Debug)]`.
impl<W> fmt::Debug for HookDefinition<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookDefinition")
            .field("id", &self.id)
            .field("ty", &self.ty)
            .field("options", &self.options)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

impl<W> HookDefinition<W> {
    /// Creates a new [`HookDefinition`] with default [`HookOptions`].
    #[must_use]
    pub fn new<F>(ty: HookType, handler: F) -> Self
    where
        F: for<'a> Fn(Context<'a, W>) -> BoxFuture<'a, Result<(), BoxError>>
            + Send
            + Sync
            + 'static,
    {
        Self {
            id: HookId::new(),
            ty,
            options: HookOptions::default(),
            description: None,
            handler: Arc::new(handler),
        }
    }

    /// Sets the explicit order.
    #[must_use]
    pub fn with_order(mut self, order: i32) -> Self {
        self.options.order = Some(order);
        self
    }

    /// Restricts this hook to targets whose tags match the given
    /// `expression`.
    ///
    /// # Errors
    ///
    /// If the `expression` cannot be parsed.
    pub fn with_tags(mut self, expression: &str) -> Result<Self, ConfigError> {
        self.options.tags = Some(TagFilter::new(expression)?);
        Ok(self)
    }

    /// Sets the timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: impl Into<TimeoutSpec>) -> Self {
        self.options.timeout = Some(timeout.into());
        self
    }

    /// Sets the [`Mode`].
    #[must_use]
    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.options.mode = mode;
        self
    }

    /// Attaches opaque data.
    #[must_use]
    pub fn with_data(mut self, data: impl Any + Send + Sync) -> Self {
        self.options.data = Some(Arc::new(data));
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Returns the effective order of this hook.
    #[must_use]
    pub fn order(&self) -> i32 {
        self.options.order.unwrap_or(DEFAULT_ORDER)
    }

    /// Indicates whether this hook runs for a target with the given `tags`.
    #[must_use]
    pub fn applies_to<I, S>(&self, tags: I) -> bool
    where
        S: AsRef<str>,
        I: IntoIterator<Item = S> + Clone,
    {
        self.options.mode != Mode::Skip
            && self.options.tags.as_ref().map_or(true, |f| f.evaluate(tags))
    }

    /// Invokes the handler of this hook.
    pub fn call<'a>(
        &self,
        ctx: Context<'a, W>,
    ) -> BoxFuture<'a, Result<(), BoxError>> {
        (self.handler)(ctx)
    }
}

#[cfg(test)]
mod tests {
    use futures::FutureExt as _;

    use super::*;

    fn noop(ty: HookType) -> HookDefinition<()> {
        HookDefinition::new(ty, |_| async { Ok(()) }.boxed())
    }

    #[test]
    fn phases_and_targets() {
        for ty in HookType::ALL {
            let target = ty.target();
            match target {
                Some(kind) => {
                    assert_eq!(HookType::of(ty.phase(), kind), Some(ty));
                }
                None => assert!(matches!(
                    ty,
                    HookType::BeforeStep | HookType::AfterStep,
                )),
            }
            assert_eq!(HookType::ALL[ty.index()], ty);
        }
        assert_eq!(HookType::of(HookPhase::Before, ScopeKind::Root), None);
    }

    #[test]
    fn default_order() {
        assert_eq!(noop(HookType::BeforeScenario).order(), DEFAULT_ORDER);
        assert_eq!(noop(HookType::BeforeScenario).with_order(1).order(), 1);
    }

    #[test]
    fn tag_and_mode_filtering() {
        let hook = noop(HookType::AfterScenario).with_tags("@db").unwrap();
        assert!(hook.applies_to(["@db", "@slow"]));
        assert!(!hook.applies_to(["@slow"]));

        let hook = noop(HookType::AfterScenario).with_mode(Mode::Skip);
        assert!(!hook.applies_to(["@db"]));

        assert!(noop(HookType::BeforeStep).applies_to(Vec::<String>::new()));
    }
}
