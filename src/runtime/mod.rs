// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! [`StepRuntime`]: the side channel carrying the data table, the docstring
//! and the metadata of the step being executed.
//!
//! A [`StepRuntime`] lives alongside a world for the whole scenario run, but
//! holds something only while a step is being executed: everything attached
//! to it is cleared once the step completes.

pub mod docstring;
pub mod metadata;
pub mod table;

use crate::error::{Error, Result};

pub use self::{
    docstring::Docstring,
    metadata::{DefinitionInfo, ScopeInfo, StepInfo, StepMetadata},
    table::{
        coercion_defaults, set_coercion_default, shape, CoercionDefaults,
        Headerless, Horizontal, Matrix, Record, Shape, ShapeKind,
        TableOptions, Value, Vertical,
    },
};

/// Side channel of the step being executed.
#[derive(Clone, Debug, Default)]
pub struct StepRuntime {
    /// Raw data table of the current step.
    table: Option<Vec<Vec<String>>>,

    /// [`Docstring`] of the current step.
    docstring: Option<Docstring>,

    /// [`StepMetadata`] of the current step.
    metadata: Option<StepMetadata>,
}

impl StepRuntime {
    /// Creates a new empty [`StepRuntime`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches everything related to the step about to be executed.
    pub fn attach(
        &mut self,
        metadata: StepMetadata,
        table: Option<Vec<Vec<String>>>,
        docstring: Option<Docstring>,
    ) {
        self.metadata = Some(metadata);
        self.table = table;
        self.docstring = docstring;
    }

    /// Clears everything attached.
    pub fn clear(&mut self) {
        self.metadata = None;
        self.table = None;
        self.docstring = None;
    }

    /// Indicates whether a data table is attached.
    #[must_use]
    pub const fn has_table(&self) -> bool {
        self.table.is_some()
    }

    /// Indicates whether a [`Docstring`] is attached.
    #[must_use]
    pub const fn has_docstring(&self) -> bool {
        self.docstring.is_some()
    }

    /// Returns the [`StepInfo`] of the step being executed.
    #[must_use]
    pub fn current_step(&self) -> Option<&StepInfo> {
        self.metadata.as_ref().map(|m| &m.step)
    }

    /// Returns the full [`StepMetadata`] of the step being executed.
    #[must_use]
    pub const fn step_metadata(&self) -> Option<&StepMetadata> {
        self.metadata.as_ref()
    }

    /// Returns the attached data table as is.
    #[must_use]
    pub fn raw_table(&self) -> Option<&[Vec<String>]> {
        self.table.as_deref()
    }

    /// Returns the attached data table shaped as `S`.
    ///
    /// # Errors
    ///
    /// [`Error::Table`] if the table doesn't fit the `S` [`Shape`].
    pub fn get_table<S: Shape>(
        &self,
        options: TableOptions,
    ) -> Result<Option<S::Output>> {
        self.table
            .as_deref()
            .map(|rows| shape::<S>(rows, options))
            .transpose()
            .map_err(Error::from)
    }

    /// Same as [`StepRuntime::get_table()`], but detaches the table once it
    /// has been shaped successfully.
    ///
    /// # Errors
    ///
    /// [`Error::Table`] if the table doesn't fit the `S` [`Shape`].
    pub fn consume_table<S: Shape>(
        &mut self,
        options: TableOptions,
    ) -> Result<Option<S::Output>> {
        let out = self.get_table::<S>(options)?;
        self.table = None;
        Ok(out)
    }

    /// Same as [`StepRuntime::consume_table()`], but fails if no table is
    /// attached.
    ///
    /// # Errors
    ///
    /// - [`Error::MissingTable`] if no table is attached.
    /// - [`Error::Table`] if the table doesn't fit the `S` [`Shape`].
    pub fn require_table<S: Shape>(
        &mut self,
        options: TableOptions,
    ) -> Result<S::Output> {
        self.consume_table::<S>(options)?
            .ok_or_else(|| Error::MissingTable { step: self.step_text() })
    }

    /// Returns the attached [`Docstring`].
    #[must_use]
    pub const fn get_docstring(&self) -> Option<&Docstring> {
        self.docstring.as_ref()
    }

    /// Detaches and returns the attached [`Docstring`].
    pub fn consume_docstring(&mut self) -> Option<Docstring> {
        self.docstring.take()
    }

    /// Same as [`StepRuntime::consume_docstring()`], but fails if no
    /// [`Docstring`] is attached.
    ///
    /// # Errors
    ///
    /// [`Error::MissingDocstring`] if no [`Docstring`] is attached.
    pub fn require_docstring(&mut self) -> Result<Docstring> {
        self.docstring
            .take()
            .ok_or_else(|| Error::MissingDocstring { step: self.step_text() })
    }

    /// Returns the text of the current step for error reporting.
    fn step_text(&self) -> String {
        self.current_step()
            .map_or_else(|| "<unknown>".to_owned(), |s| s.text.clone())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use futures::FutureExt as _;
    use regex::Regex;

    use super::*;
    use crate::step::{ResolvedStep, StepDefinition};

    fn attached() -> StepRuntime {
        let def = Arc::new(StepDefinition::<()>::given(
            Regex::new("^users$").unwrap(),
            |_, _| async { Ok(()) }.boxed(),
        ));
        let step = ResolvedStep::resolve(def, "Given", "users").unwrap();

        let mut runtime = StepRuntime::new();
        runtime.attach(
            StepMetadata::of_step(0, &step),
            Some(vec![
                vec!["id".into(), "flag".into()],
                vec!["1".into(), "true".into()],
            ]),
            Some(Docstring::new("{}").with_media_type("json")),
        );
        runtime
    }

    #[test]
    fn exposes_attached_data() {
        let runtime = attached();

        assert!(runtime.has_table());
        assert!(runtime.has_docstring());
        assert_eq!(runtime.current_step().map(|s| s.text.as_str()), Some("users"));
        assert_eq!(
            runtime.step_metadata().and_then(|m| m.definition.as_ref()).map(|d| d.pattern.as_str()),
            Some("^users$"),
        );
        assert_eq!(
            runtime.get_docstring().and_then(|d| d.media_type.as_deref()),
            Some("json"),
        );

        let rows = runtime
            .get_table::<Horizontal>(TableOptions::coerce(true))
            .unwrap()
            .unwrap();
        assert_eq!(rows[0]["id"], Value::Integer(1));
        assert!(runtime.has_table());
    }

    #[test]
    fn consume_detaches() {
        let mut runtime = attached();

        assert!(runtime.consume_table::<Headerless>(TableOptions::default()).unwrap().is_some());
        assert!(!runtime.has_table());
        assert!(runtime.consume_table::<Headerless>(TableOptions::default()).unwrap().is_none());

        assert_eq!(runtime.require_docstring().unwrap().content, "{}");
        assert!(!runtime.has_docstring());
    }

    #[test]
    fn require_fails_when_missing() {
        let mut runtime = attached();
        runtime.clear();

        assert!(runtime.current_step().is_none());
        assert!(matches!(
            runtime.require_table::<Vertical>(TableOptions::default()),
            Err(Error::MissingTable { .. }),
        ));
        assert!(matches!(
            runtime.require_docstring(),
            Err(Error::MissingDocstring { .. }),
        ));
    }

    #[test]
    fn keeps_table_on_shape_error() {
        let mut runtime = attached();

        assert!(matches!(
            runtime.consume_table::<Vertical>(TableOptions::default()),
            Ok(_),
        ));

        let mut runtime = attached();
        runtime.table = Some(vec![vec!["a".into(), "b".into(), "c".into()]]);
        assert!(matches!(
            runtime.consume_table::<Vertical>(TableOptions::default()),
            Err(Error::Table(_)),
        ));
        assert!(runtime.has_table());
    }
}
