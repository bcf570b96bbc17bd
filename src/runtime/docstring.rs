// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! [Doc string][0] attached to a step.
//!
//! [0]: https://cucumber.io/docs/gherkin/reference#doc-strings

use derive_more::with_trait::Display;

/// [Doc string][0] attached to a step.
///
/// [0]: https://cucumber.io/docs/gherkin/reference#doc-strings
#[derive(Clone, Debug, Display, Eq, PartialEq)]
#[display("{content}")]
pub struct Docstring {
    /// Content of the docstring.
    pub content: String,

    /// Media type the docstring is annotated with (like `json`), if any.
    pub media_type: Option<String>,
}

impl Docstring {
    /// Creates a new [`Docstring`] without a media type.
    #[must_use]
    pub fn new(content: impl Into<String>) -> Self {
        Self { content: content.into(), media_type: None }
    }

    /// Sets the media type.
    #[must_use]
    pub fn with_media_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = Some(media_type.into());
        self
    }
}

impl From<&str> for Docstring {
    fn from(content: &str) -> Self {
        Self::new(content)
    }
}

impl From<String> for Docstring {
    fn from(content: String) -> Self {
        Self::new(content)
    }
}
