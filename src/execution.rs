// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! [`ScenarioExecution`]: a resolved, runnable scenario and its terminal
//! [`ScenarioStatus`].

use std::{
    fmt,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use derive_more::with_trait::Display;
use itertools::Itertools as _;

use crate::{
    error::Error,
    hook::ScenarioInfo,
    mode::Mode,
    scope::{inherited_tags, Example, ExecutionId, ScopeKind, ScopeNode},
    step::ResolvedStep,
    timeout::TimeoutSpec,
};

/// Separator of scope names in a [`ScenarioExecution::qualified_name`].
pub const QUALIFIED_NAME_SEPARATOR: &str = " > ";

/// Terminal state of a [`ScenarioExecution`].
#[derive(Clone, Debug, Default, Display)]
pub enum ScenarioStatus {
    /// Not run yet.
    #[default]
    #[display("not run")]
    NotRun,

    /// Every step has passed.
    #[display("passed")]
    Passed,

    /// Scenario has failed with the given [`Error`].
    #[display("failed: {_0}")]
    Failed(Error),

    /// Scenario was skipped.
    #[display("skipped")]
    Skipped,

    /// Scenario is pending for the given reason.
    #[display("pending{}", _0.as_ref().map(|r| format!(": {r}")).unwrap_or_default())]
    Pending(Option<String>),
}

impl ScenarioStatus {
    /// Indicates whether this is a terminal status.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::NotRun)
    }

    /// Indicates whether this is a [`ScenarioStatus::Passed`].
    #[must_use]
    pub const fn is_passed(&self) -> bool {
        matches!(self, Self::Passed)
    }

    /// Indicates whether this is a [`ScenarioStatus::Failed`].
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// Indicates whether this is a [`ScenarioStatus::Pending`].
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::Pending(_))
    }
}

/// Outcome of a single step.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum StepStatus {
    /// Step has passed.
    #[display("passed")]
    Passed,

    /// Step has failed.
    #[display("failed")]
    Failed,

    /// Step is pending.
    #[display("pending")]
    Pending,

    /// Step wasn't run.
    #[display("skipped")]
    Skipped,
}

/// Mutable part of a [`ScenarioExecution`].
#[derive(Debug, Default)]
struct State {
    status: ScenarioStatus,
    marks: usize,
}

/// Resolved, runnable instance of a scenario or of a scenario outline
/// example.
pub struct ScenarioExecution<W> {
    /// Unique ID of this execution.
    pub id: ExecutionId,

    /// Name of the scenario.
    pub name: String,

    /// Name of the scenario prefixed with the names of its enclosing scopes.
    pub qualified_name: String,

    /// Tags of the scenario along with the ones inherited from its enclosing
    /// scopes, outermost first and without duplicates.
    pub tags: Vec<String>,

    /// Declared [`Mode`] of the scenario.
    pub mode: Mode,

    /// Indicates whether the scenario or any of its enclosing scopes is
    /// marked as pending.
    pub pending: bool,

    /// Reason of the nearest pending mark.
    pub pending_reason: Option<String>,

    /// Timeout of the scenario, or the one of its nearest enclosing scope.
    pub timeout: Option<TimeoutSpec>,

    /// Feature the scenario belongs to.
    pub feature: Option<Arc<ScopeNode<W>>>,

    /// Rule the scenario belongs to.
    pub rule: Option<Arc<ScopeNode<W>>>,

    /// Scenario outline the scenario is generated from.
    pub outline: Option<Arc<ScopeNode<W>>>,

    /// Scope of the scenario itself.
    pub scope: Arc<ScopeNode<W>>,

    /// Enclosing scopes, outermost first, the root excluded.
    pub ancestors: Vec<Arc<ScopeNode<W>>>,

    /// Steps to execute: the backgrounds of the enclosing feature and rule
    /// first, then the scenario's own ones.
    pub steps: Vec<Arc<ResolvedStep<W>>>,

    /// Examples row of the scenario.
    pub example: Option<Example>,

    /// Terminal state.
    state: Mutex<State>,
}

// Implemented manually to omit redundant `W: Debug` trait bound, imposed by
// `#[derive(Debug)]`.
impl<W> fmt::Debug for ScenarioExecution<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScenarioExecution")
            .field("id", &self.id)
            .field("qualified_name", &self.qualified_name)
            .field("tags", &self.tags)
            .field("mode", &self.mode)
            .field("pending", &self.pending)
            .field("timeout", &self.timeout)
            .field("steps", &self.steps.len())
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}

impl<W> ScenarioExecution<W> {
    /// Resolves a [`ScenarioExecution`] of the given `scope` enclosed by the
    /// given `ancestors` (outermost first, the root excluded).
    #[must_use]
    pub fn new(
        scope: Arc<ScopeNode<W>>,
        ancestors: Vec<Arc<ScopeNode<W>>>,
    ) -> Self {
        let nearest = |kind: ScopeKind| {
            ancestors.iter().rev().find(|s| s.kind == kind).cloned()
        };
        let chain = || ancestors.iter().chain(Some(&scope));

        let qualified_name = chain()
            .map(|s| s.name.as_str())
            .filter(|n| !n.is_empty())
            .join(QUALIFIED_NAME_SEPARATOR);
        let tags = inherited_tags(chain());
        let pending_from = chain().rev().find(|s| s.pending);
        let steps = ancestors
            .iter()
            .filter(|s| matches!(s.kind, ScopeKind::Feature | ScopeKind::Rule))
            .chain(Some(&scope))
            .flat_map(|s| s.steps.iter().cloned())
            .collect();

        Self {
            id: ExecutionId::new(),
            name: scope.name.clone(),
            qualified_name,
            tags,
            mode: scope.mode,
            pending: pending_from.is_some(),
            pending_reason: pending_from.and_then(|s| s.pending_reason.clone()),
            timeout: chain().rev().find_map(|s| s.timeout),
            feature: nearest(ScopeKind::Feature),
            rule: nearest(ScopeKind::Rule),
            outline: nearest(ScopeKind::ScenarioOutline),
            example: scope.example.clone(),
            steps,
            ancestors: ancestors.clone(),
            scope,
            state: Mutex::default(),
        }
    }

    /// Returns the scope chain of this execution: the given `root`, the
    /// ancestors and the scenario scope itself.
    #[must_use]
    pub fn chain(&self, root: &Arc<ScopeNode<W>>) -> Vec<Arc<ScopeNode<W>>> {
        let mut chain = Vec::with_capacity(self.ancestors.len() + 2);
        chain.push(Arc::clone(root));
        chain.extend(self.ancestors.iter().cloned());
        chain.push(Arc::clone(&self.scope));
        chain
    }

    /// Returns the [`ScenarioInfo`] passed to hooks.
    #[must_use]
    pub fn info(&self) -> ScenarioInfo {
        ScenarioInfo {
            id: self.id,
            name: self.name.clone(),
            qualified_name: self.qualified_name.clone(),
            tags: self.tags.clone(),
        }
    }

    /// Returns the current [`ScenarioStatus`].
    #[must_use]
    pub fn status(&self) -> ScenarioStatus {
        self.state().status.clone()
    }

    /// Returns how many times any of the `mark_*()` methods has been called
    /// since the last [`reset()`].
    ///
    /// [`reset()`]: ScenarioExecution::reset
    #[must_use]
    pub fn marks(&self) -> usize {
        self.state().marks
    }

    /// Marks this execution as [`ScenarioStatus::Passed`].
    ///
    /// Returns `false` if a terminal status has been recorded already.
    pub fn mark_passed(&self) -> bool {
        self.mark(ScenarioStatus::Passed)
    }

    /// Marks this execution as [`ScenarioStatus::Failed`].
    ///
    /// Returns `false` if a terminal status has been recorded already.
    pub fn mark_failed(&self, err: Error) -> bool {
        self.mark(ScenarioStatus::Failed(err))
    }

    /// Marks this execution as [`ScenarioStatus::Skipped`].
    ///
    /// Returns `false` if a terminal status has been recorded already.
    pub fn mark_skipped(&self) -> bool {
        self.mark(ScenarioStatus::Skipped)
    }

    /// Marks this execution as [`ScenarioStatus::Pending`].
    ///
    /// Returns `false` if a terminal status has been recorded already.
    pub fn mark_pending(&self, reason: Option<String>) -> bool {
        self.mark(ScenarioStatus::Pending(reason))
    }

    /// Resets this execution before a new run attempt.
    pub fn reset(&self) {
        *self.state() = State::default();
    }

    /// Records the given terminal `status`, unless one is recorded already.
    fn mark(&self, status: ScenarioStatus) -> bool {
        let mut state = self.state();
        state.marks += 1;
        if state.status.is_terminal() {
            tracing::warn!(
                scenario = %self.qualified_name,
                recorded = %state.status,
                attempted = %status,
                "terminal status is recorded already",
            );
            return false;
        }
        state.status = status;
        true
    }

    /// Locks the [`State`], ignoring poisoning.
    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn execution() -> ScenarioExecution<()> {
        let feature = Arc::new(
            ScopeNode::feature("Eating")
                .with_tags(["@food", "@slow"])
                .with_timeout(TimeoutSpec::millis(1000)),
        );
        let outline = Arc::new(
            ScopeNode::outline("Eat <n>")
                .with_tags(["@slow", "@outline"])
                .pending_because("menu is not ready"),
        );
        let scenario = Arc::new(
            ScopeNode::scenario("Eat 5")
                .with_tags(["food", "@mine"])
                .with_example(Example::new(0, [("n", "5")])),
        );
        ScenarioExecution::new(scenario, vec![feature, outline])
    }

    #[test]
    fn resolves_from_chain() {
        let exec = execution();

        assert_eq!(exec.name, "Eat 5");
        assert_eq!(exec.qualified_name, "Eating > Eat <n> > Eat 5");
        assert_eq!(exec.tags, ["@food", "@slow", "@outline", "@mine"]);
        assert!(exec.pending);
        assert_eq!(exec.pending_reason.as_deref(), Some("menu is not ready"));
        assert_eq!(exec.timeout.and_then(TimeoutSpec::to_millis), Some(1000));
        assert_eq!(exec.feature.as_ref().map(|f| f.name.as_str()), Some("Eating"));
        assert!(exec.rule.is_none());
        assert_eq!(exec.outline.as_ref().map(|f| f.name.as_str()), Some("Eat <n>"));
        assert_eq!(exec.example.as_ref().map(|e| e.index), Some(0));
    }

    #[test]
    fn exactly_one_terminal_status() {
        let exec = execution();
        assert!(!exec.status().is_terminal());

        assert!(exec.mark_pending(Some("later".into())));
        assert!(!exec.mark_passed());
        assert!(!exec.mark_failed(Error::NoActiveScenario));

        assert!(matches!(exec.status(), ScenarioStatus::Pending(Some(r)) if r == "later"));
        assert_eq!(exec.marks(), 3);

        exec.reset();
        assert!(!exec.status().is_terminal());
        assert_eq!(exec.marks(), 0);
        assert!(exec.mark_skipped());
    }

    #[test]
    fn displays_status() {
        assert_eq!(ScenarioStatus::Pending(None).to_string(), "pending");
        assert_eq!(
            ScenarioStatus::Pending(Some("later".into())).to_string(),
            "pending: later",
        );
        assert_eq!(
            ScenarioStatus::Failed(Error::ExpectedFailure).to_string(),
            "failed: expected scenario to fail",
        );
    }
}
