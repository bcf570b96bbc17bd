// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! [`StepDefinition`]s and the [`ResolvedStep`]s bound to them.

use std::{fmt, iter, sync::Arc};

use futures::future::BoxFuture;
use gherkin::StepType;
use regex::Regex;

use super::{
    context::{CaptureName, Context},
    location::Location,
    signal::Result,
};
use crate::{
    error::{self, Error},
    runtime::Docstring,
    scope::StepId,
    world::SharedWorld,
};

/// Handler of a [`StepDefinition`].
pub type StepFn<W> = Arc<
    dyn for<'a> Fn(&'a SharedWorld<W>, Context<'a>) -> BoxFuture<'a, Result>
        + Send
        + Sync,
>;

/// Step handler along with the [`Regex`] it's matched by.
pub struct StepDefinition<W> {
    /// [`StepType`] this definition is declared for.
    pub ty: StepType,

    /// [`Regex`] the step text is matched with.
    pub pattern: Regex,

    /// [`Location`] of this definition in Rust sources.
    pub location: Location,

    /// Handler of the step.
    handler: StepFn<W>,
}

// Implemented manually to omit redundant `W: Debug` trait bound, imposed by
// `#[derive(Debug)]`.
impl<W> fmt::Debug for StepDefinition<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepDefinition")
            .field("ty", &self.ty)
            .field("pattern", &self.pattern.as_str())
            .field("location", &self.location)
            .finish_non_exhaustive()
    }
}

impl<W> StepDefinition<W> {
    /// Creates a new [`StepDefinition`] located at the caller.
    #[must_use]
    #[track_caller]
    pub fn new<F>(ty: StepType, pattern: Regex, handler: F) -> Self
    where
        F: for<'a> Fn(&'a SharedWorld<W>, Context<'a>) -> BoxFuture<'a, Result>
            + Send
            + Sync
            + 'static,
    {
        Self {
            ty,
            pattern,
            location: Location::caller(),
            handler: Arc::new(handler),
        }
    }

    /// Creates a new [Given] [`StepDefinition`].
    ///
    /// [Given]: https://cucumber.io/docs/gherkin/reference#given
    #[must_use]
    #[track_caller]
    pub fn given<F>(pattern: Regex, handler: F) -> Self
    where
        F: for<'a> Fn(&'a SharedWorld<W>, Context<'a>) -> BoxFuture<'a, Result>
            + Send
            + Sync
            + 'static,
    {
        Self::new(StepType::Given, pattern, handler)
    }

    /// Creates a new [When] [`StepDefinition`].
    ///
    /// [When]: https://cucumber.io/docs/gherkin/reference#when
    #[must_use]
    #[track_caller]
    pub fn when<F>(pattern: Regex, handler: F) -> Self
    where
        F: for<'a> Fn(&'a SharedWorld<W>, Context<'a>) -> BoxFuture<'a, Result>
            + Send
            + Sync
            + 'static,
    {
        Self::new(StepType::When, pattern, handler)
    }

    /// Creates a new [Then] [`StepDefinition`].
    ///
    /// [Then]: https://cucumber.io/docs/gherkin/reference#then
    #[must_use]
    #[track_caller]
    pub fn then<F>(pattern: Regex, handler: F) -> Self
    where
        F: for<'a> Fn(&'a SharedWorld<W>, Context<'a>) -> BoxFuture<'a, Result>
            + Send
            + Sync
            + 'static,
    {
        Self::new(StepType::Then, pattern, handler)
    }

    /// Matches the given step `text`, returning the captured groups (the
    /// whole match being the first one), if it matches at all.
    #[must_use]
    pub fn captures(&self, text: &str) -> Option<Vec<(CaptureName, String)>> {
        let mut locs = self.pattern.capture_locations();
        let whole = self.pattern.captures_read(&mut locs, text)?;

        // All indices are obtained from the source string.
        #[allow(clippy::string_slice)]
        let matches = self
            .pattern
            .capture_names()
            .map(|n| n.map(str::to_owned))
            .zip(iter::once(whole.as_str().to_owned()).chain(
                (1..locs.len()).map(|i| {
                    locs.get(i).map_or("", |(s, e)| &text[s..e]).to_owned()
                }),
            ))
            .collect();
        Some(matches)
    }

    /// Invokes the handler of this [`StepDefinition`].
    ///
    /// The handler locks the `world` itself, for as long as it needs it.
    pub fn call<'a>(
        &self,
        world: &'a SharedWorld<W>,
        ctx: Context<'a>,
    ) -> BoxFuture<'a, Result> {
        (self.handler)(world, ctx)
    }
}

/// Step of a scope bound to the [`StepDefinition`] matching it.
pub struct ResolvedStep<W> {
    /// Unique ID of this step.
    pub id: StepId,

    /// Keyword the step is written with (`Given`, `And`, `But`, etc).
    pub keyword: String,

    /// Text of the step.
    pub text: String,

    /// Raw data table attached to the step.
    pub table: Option<Vec<Vec<String>>>,

    /// Docstring attached to the step.
    pub docstring: Option<Docstring>,

    /// [`Location`] of the step in its `.feature` file.
    pub location: Option<Location>,

    /// [`StepDefinition`] matching the step.
    pub definition: Arc<StepDefinition<W>>,

    /// Captured groups of the step text.
    pub matches: Vec<(CaptureName, String)>,
}

// Implemented manually to omit redundant `W: Debug` trait bound, imposed by
// `#[derive(Debug)]`.
impl<W> fmt::Debug for ResolvedStep<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedStep")
            .field("id", &self.id)
            .field("keyword", &self.keyword)
            .field("text", &self.text)
            .field("table", &self.table)
            .field("docstring", &self.docstring)
            .field("location", &self.location)
            .field("definition", &self.definition)
            .finish_non_exhaustive()
    }
}

impl<W> ResolvedStep<W> {
    /// Binds the step `text` to the given [`StepDefinition`].
    ///
    /// # Errors
    ///
    /// [`Error::StepMismatch`] if the `text` isn't matched by the definition.
    pub fn resolve(
        definition: Arc<StepDefinition<W>>,
        keyword: impl Into<String>,
        text: impl Into<String>,
    ) -> error::Result<Self> {
        let text = text.into();
        let matches = definition.captures(&text).ok_or_else(|| {
            Error::StepMismatch {
                text: text.clone(),
                pattern: definition.pattern.as_str().to_owned(),
            }
        })?;
        Ok(Self {
            id: StepId::new(),
            keyword: keyword.into(),
            text,
            table: None,
            docstring: None,
            location: None,
            definition,
            matches,
        })
    }

    /// Binds the given [`gherkin::Step`] to the given [`StepDefinition`],
    /// carrying over its data table and docstring.
    ///
    /// # Errors
    ///
    /// [`Error::StepMismatch`] if the step isn't matched by the definition.
    pub fn from_gherkin(
        definition: Arc<StepDefinition<W>>,
        step: &gherkin::Step,
    ) -> error::Result<Self> {
        let mut resolved =
            Self::resolve(definition, step.keyword.trim(), &step.value)?;
        resolved.table = step.table.as_ref().map(|t| t.rows.clone());
        resolved.docstring = step.docstring.as_deref().map(Docstring::new);
        Ok(resolved)
    }

    /// Returns the [`StepType`] of this step.
    #[must_use]
    pub fn ty(&self) -> StepType {
        self.definition.ty
    }

    /// Attaches a raw data table.
    #[must_use]
    pub fn with_table<R, C>(mut self, rows: R) -> Self
    where
        R: IntoIterator,
        R::Item: IntoIterator<Item = C>,
        C: Into<String>,
    {
        self.table = Some(
            rows.into_iter()
                .map(|r| r.into_iter().map(Into::into).collect())
                .collect(),
        );
        self
    }

    /// Attaches a [`Docstring`].
    #[must_use]
    pub fn with_docstring(mut self, docstring: impl Into<Docstring>) -> Self {
        self.docstring = Some(docstring.into());
        self
    }

    /// Sets the [`Location`] in a `.feature` file.
    #[must_use]
    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }
}

#[cfg(test)]
mod tests {
    use futures::{lock::Mutex, FutureExt as _};

    use super::*;
    use crate::runtime::StepRuntime;

    #[derive(Default)]
    struct Basket {
        cucumbers: u32,
    }

    fn eat() -> Arc<StepDefinition<Basket>> {
        Arc::new(StepDefinition::<Basket>::when(
            Regex::new(r"^I eat (?P<count>\d+) cucumbers?$").unwrap(),
            |basket, ctx| {
                let count = ctx.arg(0).and_then(|n| n.parse::<u32>().ok());
                async move {
                    basket.lock().await.cucumbers -= count.unwrap_or_default();
                    Ok(())
                }
                .boxed()
            },
        ))
    }

    #[test]
    fn resolves_matching_text() {
        let step = ResolvedStep::resolve(eat(), "When", "I eat 3 cucumbers")
            .unwrap()
            .with_table([["a", "b"]]);

        assert_eq!(step.ty(), StepType::When);
        assert_eq!(step.matches[1], (Some("count".to_owned()), "3".to_owned()));
        assert_eq!(step.table, Some(vec![vec!["a".to_owned(), "b".to_owned()]]));
        assert!(step.definition.location.path.ends_with("definition.rs"));
    }

    #[test]
    fn rejects_mismatching_text() {
        assert!(matches!(
            ResolvedStep::resolve(eat(), "When", "I drink water"),
            Err(Error::StepMismatch { .. }),
        ));
    }

    #[tokio::test]
    async fn calls_handler() {
        let step = ResolvedStep::resolve(eat(), "When", "I eat 2 cucumbers")
            .unwrap();
        let basket = Arc::new(Mutex::new(Basket { cucumbers: 5 }));
        let mut runtime = StepRuntime::default();

        step.definition
            .call(&basket, Context::new(&step.matches, &mut runtime))
            .await
            .unwrap();

        assert_eq!(basket.lock().await.cucumbers, 3);
    }
}
