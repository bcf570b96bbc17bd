// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Source [`Location`]s of steps, step definitions and scopes.

use std::{panic, sync::Arc};

use derive_more::with_trait::Display;

/// Location in a source file: either a `.feature` file or a Rust file a step
/// definition is declared in.
#[derive(Clone, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[display("{path}:{line}:{column}")]
pub struct Location {
    /// Path to the file.
    pub path: Arc<str>,

    /// Line in the file.
    pub line: u32,

    /// Column in the file.
    pub column: u32,
}

impl Location {
    /// Creates a new [`Location`].
    #[must_use]
    pub fn new(path: impl Into<Arc<str>>, line: u32, column: u32) -> Self {
        Self { path: path.into(), line, column }
    }

    /// Returns the [`Location`] of the caller.
    #[must_use]
    #[track_caller]
    pub fn caller() -> Self {
        let loc = panic::Location::caller();
        Self::new(loc.file(), loc.line(), loc.column())
    }

    /// Returns the file name of the path.
    #[must_use]
    pub fn filename(&self) -> &str {
        self.path.rsplit(['/', '\\']).next().unwrap_or(&self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_full_path() {
        let loc = Location::new("features/eat.feature", 3, 5);

        assert_eq!(loc.to_string(), "features/eat.feature:3:5");
        assert_eq!(loc.filename(), "eat.feature");
        assert_eq!(Location::new("a\\b.rs", 1, 1).filename(), "b.rs");
    }

    #[test]
    fn captures_caller() {
        let loc = Location::caller();

        assert!(loc.path.ends_with("location.rs"));
        assert_eq!(loc.line, line!() - 3);
    }
}
