// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Errors of shaping a raw data table.

use derive_more::with_trait::{Display, Error};

/// Raw data table cannot be shaped as requested.
#[derive(Clone, Debug, Display, Eq, Error, PartialEq)]
pub enum TableError {
    /// Shape requires a header, but the table has no rows.
    #[display("`{shape}` table requires at least one row")]
    Empty {
        /// Name of the requested shape.
        shape: &'static str,
    },

    /// Row has another number of cells than the header.
    #[display("row {row} has {found} cells, but {expected} are expected")]
    Ragged {
        /// Zero-based index of the row.
        row: usize,

        /// Number of cells in the header.
        expected: usize,

        /// Number of cells in the row.
        found: usize,
    },
}
