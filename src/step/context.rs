// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! [`Context`] of a step handler invocation.

use std::str::FromStr;

use crate::runtime::StepRuntime;

/// Name of a capturing group inside a [`regex`].
pub type CaptureName = Option<String>;

/// Context of a step handler invocation.
///
/// Gives access to the arguments matched out of the step text, and to the
/// [`StepRuntime`] holding the attached data table, docstring and metadata.
#[derive(Debug)]
pub struct Context<'a> {
    /// [`Regex`] matches of the step text, the whole match being the first.
    ///
    /// [`Regex`]: regex::Regex
    pub matches: &'a [(CaptureName, String)],

    /// [`StepRuntime`] of the current step.
    pub runtime: &'a mut StepRuntime,
}

impl<'a> Context<'a> {
    /// Creates a new [`Context`].
    #[must_use]
    pub fn new(
        matches: &'a [(CaptureName, String)],
        runtime: &'a mut StepRuntime,
    ) -> Self {
        Self { matches, runtime }
    }

    /// Returns the matched argument at the given `index`, the whole match
    /// excluded.
    #[must_use]
    pub fn arg(&self, index: usize) -> Option<&str> {
        self.matches.get(index + 1).map(|(_, v)| v.as_str())
    }

    /// Returns all the matched arguments, the whole match excluded.
    pub fn args(&self) -> impl Iterator<Item = &str> + '_ {
        self.matches.iter().skip(1).map(|(_, v)| v.as_str())
    }

    /// Returns the argument matched by the named capturing group.
    #[must_use]
    pub fn named(&self, name: &str) -> Option<&str> {
        self.matches
            .iter()
            .find(|(n, _)| n.as_deref() == Some(name))
            .map(|(_, v)| v.as_str())
    }

    /// Parses the argument at the given `index` into a `T`.
    ///
    /// Returns [`None`] if there is no such argument.
    ///
    /// # Errors
    ///
    /// If the argument cannot be parsed.
    pub fn parse<T: FromStr>(&self, index: usize) -> Option<Result<T, T::Err>> {
        self.arg(index).map(str::parse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matches() -> Vec<(CaptureName, String)> {
        vec![
            (None, "I eat 5 cucumbers".into()),
            (Some("count".into()), "5".into()),
            (None, "cucumbers".into()),
        ]
    }

    #[test]
    fn positional_and_named_args() {
        let matches = matches();
        let mut runtime = StepRuntime::default();
        let ctx = Context::new(&matches, &mut runtime);

        assert_eq!(ctx.arg(0), Some("5"));
        assert_eq!(ctx.arg(1), Some("cucumbers"));
        assert_eq!(ctx.arg(2), None);
        assert_eq!(ctx.named("count"), Some("5"));
        assert_eq!(ctx.named("missing"), None);
        assert_eq!(ctx.args().collect::<Vec<_>>(), ["5", "cucumbers"]);
    }

    #[test]
    fn parses_args() {
        let matches = matches();
        let mut runtime = StepRuntime::default();
        let ctx = Context::new(&matches, &mut runtime);

        assert_eq!(ctx.parse::<u32>(0), Some(Ok(5)));
        assert!(matches!(ctx.parse::<u32>(1), Some(Err(_))));
        assert!(ctx.parse::<u32>(5).is_none());
    }
}
