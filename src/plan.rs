// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Resolved [`TestPlan`]: the scope tree with a [`ScenarioExecution`] bound to
//! every scenario.

use std::{fmt, sync::Arc};

use crate::{
    execution::ScenarioExecution,
    scope::{ScopeKind, ScopeNode, ScopePlan},
};

/// Node of a [`TestPlan`].
pub struct PlanNode<W> {
    /// Scope of this node.
    pub scope: Arc<ScopeNode<W>>,

    /// Nested nodes, in declaration order.
    pub children: Vec<PlanNode<W>>,

    /// Execution of this node, if it's a [`ScopeKind::Scenario`].
    pub execution: Option<Arc<ScenarioExecution<W>>>,
}

// Implemented manually to omit redundant `W: Debug` trait bound, imposed by
// `#[derive(Debug)]`.
impl<W> fmt::Debug for PlanNode<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlanNode")
            .field("scope", &self.scope.id)
            .field("kind", &self.scope.kind)
            .field("name", &self.scope.name)
            .field("children", &self.children)
            .field("execution", &self.execution)
            .finish()
    }
}

impl<W> PlanNode<W> {
    /// Resolves the node of the given `scope` enclosed by the given
    /// `ancestors` (outermost first, the root excluded).
    fn resolve(
        scope: &Arc<ScopeNode<W>>,
        ancestors: &mut Vec<Arc<ScopeNode<W>>>,
    ) -> Self {
        let execution = (scope.kind == ScopeKind::Scenario).then(|| {
            Arc::new(ScenarioExecution::new(
                Arc::clone(scope),
                ancestors.clone(),
            ))
        });

        ancestors.push(Arc::clone(scope));
        let children = scope
            .children
            .iter()
            .map(|c| Self::resolve(c, ancestors))
            .collect();
        _ = ancestors.pop();

        Self { scope: Arc::clone(scope), children, execution }
    }

    /// Returns the [`ScenarioExecution`]s of this node and all its
    /// descendants, in declaration order.
    #[must_use]
    pub fn executions(&self) -> Vec<Arc<ScenarioExecution<W>>> {
        let mut out = Vec::new();
        self.collect_executions(&mut out);
        out
    }

    fn collect_executions(&self, out: &mut Vec<Arc<ScenarioExecution<W>>>) {
        out.extend(self.execution.iter().cloned());
        for child in &self.children {
            child.collect_executions(out);
        }
    }

    /// Looks up the node of the scope with the given `name` among this node
    /// and its descendants.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&Self> {
        if self.scope.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(name))
    }
}

/// [`PlanNode`] of a [`ScopeKind::Feature`].
pub type FeaturePlan<W> = PlanNode<W>;

/// Resolved test plan of a whole [`ScopePlan`].
pub struct TestPlan<W> {
    /// Features, in declaration order.
    pub features: Vec<FeaturePlan<W>>,
}

// Implemented manually to omit redundant `W: Debug` trait bound, imposed by
// `#[derive(Debug)]`.
impl<W> fmt::Debug for TestPlan<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestPlan").field("features", &self.features).finish()
    }
}

impl<W> TestPlan<W> {
    /// Resolves a [`TestPlan`] out of the given [`ScopePlan`], creating a
    /// fresh [`ScenarioExecution`] for every scenario.
    #[must_use]
    pub fn new(plan: &ScopePlan<W>) -> Self {
        let mut ancestors = Vec::new();
        Self {
            features: plan
                .root()
                .children
                .iter()
                .map(|f| PlanNode::resolve(f, &mut ancestors))
                .collect(),
        }
    }

    /// Returns all the [`ScenarioExecution`]s of this plan, in declaration
    /// order.
    #[must_use]
    pub fn executions(&self) -> Vec<Arc<ScenarioExecution<W>>> {
        self.features.iter().flat_map(PlanNode::executions).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan() -> ScopePlan<()> {
        ScopePlan::new(
            ScopeNode::root().with_child(
                ScopeNode::feature("Cooking")
                    .with_tags(["@kitchen"])
                    .with_child(ScopeNode::scenario("boil"))
                    .with_child(
                        ScopeNode::rule("Baking").with_child(
                            ScopeNode::outline("bake <what>")
                                .with_child(ScopeNode::scenario("bake bread"))
                                .with_child(ScopeNode::scenario("bake pie")),
                        ),
                    ),
            ),
        )
        .unwrap()
    }

    #[test]
    fn binds_executions_to_scenarios() {
        let plan = TestPlan::new(&plan());

        assert_eq!(plan.features.len(), 1);
        let names = plan
            .executions()
            .iter()
            .map(|e| e.qualified_name.clone())
            .collect::<Vec<_>>();
        assert_eq!(
            names,
            [
                "Cooking > boil",
                "Cooking > Baking > bake <what> > bake bread",
                "Cooking > Baking > bake <what> > bake pie",
            ],
        );
    }

    #[test]
    fn only_scenarios_have_executions() {
        let plan = TestPlan::new(&plan());
        let feature = &plan.features[0];

        assert!(feature.execution.is_none());
        assert!(feature.find("Baking").unwrap().execution.is_none());
        assert!(feature.find("bake <what>").unwrap().execution.is_none());

        let pie = feature.find("bake pie").unwrap().execution.as_ref().unwrap();
        assert_eq!(pie.tags, ["@kitchen"]);
        assert_eq!(pie.ancestors.len(), 3);
        assert_eq!(pie.outline.as_ref().unwrap().name, "bake <what>");
    }

    #[test]
    fn every_plan_gets_fresh_executions() {
        let scopes = plan();

        let first = TestPlan::new(&scopes).executions();
        let second = TestPlan::new(&scopes).executions();

        assert_ne!(first[0].id, second[0].id);
        assert_eq!(first[0].scope.id, second[0].scope.id);
    }
}
