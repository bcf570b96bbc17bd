// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Metadata of the step being executed.

use gherkin::StepType;

use crate::{
    scope::{Example, ScopeId, ScopeKind, ScopeNode, StepId},
    step::{Location, ResolvedStep},
};

/// Identity and source information of a scope.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ScopeInfo {
    /// ID of the scope.
    pub id: ScopeId,

    /// Kind of the scope.
    pub kind: ScopeKind,

    /// Name of the scope.
    pub name: String,

    /// Tags declared on the scope.
    pub tags: Vec<String>,

    /// Source location of the scope.
    pub location: Option<Location>,
}

impl<W> From<&ScopeNode<W>> for ScopeInfo {
    fn from(node: &ScopeNode<W>) -> Self {
        Self {
            id: node.id,
            kind: node.kind,
            name: node.name.clone(),
            tags: node.tags.clone(),
            location: node.location.clone(),
        }
    }
}

/// Identity and source information of a step.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StepInfo {
    /// ID of the step.
    pub id: StepId,

    /// Zero-based index of the step in its scenario.
    pub index: usize,

    /// Keyword of the step.
    pub keyword: String,

    /// Text of the step.
    pub text: String,

    /// Location of the step in its `.feature` file.
    pub location: Option<Location>,
}

/// Information about the step definition matching a step.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DefinitionInfo {
    /// [`StepType`] the definition is declared for.
    pub ty: StepType,

    /// Pattern of the definition.
    pub pattern: String,

    /// Location of the definition in Rust sources.
    pub location: Location,
}

/// Metadata of the step being executed.
///
/// Every field but [`StepMetadata::step`] is present only where available.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StepMetadata {
    /// Feature the step belongs to.
    pub feature: Option<ScopeInfo>,

    /// Rule the step belongs to.
    pub rule: Option<ScopeInfo>,

    /// Scenario outline the step's scenario is generated from.
    pub outline: Option<ScopeInfo>,

    /// Scenario the step belongs to.
    pub scenario: Option<ScopeInfo>,

    /// Examples row of the scenario.
    pub example: Option<Example>,

    /// Step itself.
    pub step: StepInfo,

    /// Definition matching the step.
    pub definition: Option<DefinitionInfo>,
}

impl StepMetadata {
    /// Creates [`StepMetadata`] of the given `step` at the given `index`,
    /// without any information about the enclosing scopes.
    #[must_use]
    pub fn of_step<W>(index: usize, step: &ResolvedStep<W>) -> Self {
        Self {
            feature: None,
            rule: None,
            outline: None,
            scenario: None,
            example: None,
            step: StepInfo {
                id: step.id,
                index,
                keyword: step.keyword.clone(),
                text: step.text.clone(),
                location: step.location.clone(),
            },
            definition: Some(DefinitionInfo {
                ty: step.definition.ty,
                pattern: step.definition.pattern.as_str().to_owned(),
                location: step.definition.location.clone(),
            }),
        }
    }
}
