// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Shaping raw data tables.
//!
//! A raw table is a list of rows of string cells, exactly as written in a
//! `.feature` file. It may be read in one of four [`Shape`]s:
//!
//! | Shape          | Layout                                       | Output                     |
//! |----------------|----------------------------------------------|----------------------------|
//! | [`Headerless`] | no headers                                   | `Vec<Vec<Value>>`          |
//! | [`Horizontal`] | first row is a header                        | `Vec<Record>`              |
//! | [`Vertical`]   | first column is a header, two cells per row  | `Record`                   |
//! | [`Matrix`]     | first row and first column are headers       | `LinkedHashMap<_, Record>` |
//!
//! Cells are either kept as [`Value::Text`], or coerced into inferred
//! primitive [`Value`]s, depending on [`TableOptions`] and the process-wide
//! [`CoercionDefaults`].

use std::sync::{PoisonError, RwLock};

use derive_more::with_trait::Display;
use lazy_regex::regex_is_match;
use linked_hash_map::LinkedHashMap;
use once_cell::sync::Lazy;
use sealed::sealed;
use smart_default::SmartDefault;

use crate::error::TableError;

/// Cell of a shaped table.
#[derive(Clone, Debug, Display, PartialEq)]
pub enum Value {
    /// Integer number.
    #[display("{_0}")]
    Integer(i64),

    /// Floating point number.
    #[display("{_0}")]
    Float(f64),

    /// Boolean.
    #[display("{_0}")]
    Bool(bool),

    /// Raw text.
    #[display("{_0}")]
    Text(String),
}

impl Value {
    /// Infers a primitive [`Value`] out of the given `raw` cell.
    ///
    /// `true`/`false` become a [`Value::Bool`], integral numbers a
    /// [`Value::Integer`], other decimal numbers a [`Value::Float`], and
    /// anything else stays a [`Value::Text`].
    #[must_use]
    pub fn coerce(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed {
            "true" => return Self::Bool(true),
            "false" => return Self::Bool(false),
            _ => {}
        }
        if regex_is_match!(r"^-?\d+$", trimmed) {
            if let Ok(i) = trimmed.parse() {
                return Self::Integer(i);
            }
        }
        if regex_is_match!(r"^-?(\d+\.?\d*|\.\d+)([eE][-+]?\d+)?$", trimmed) {
            if let Ok(f) = trimmed.parse() {
                return Self::Float(f);
            }
        }
        Self::Text(raw.to_owned())
    }

    /// Creates a [`Value::Text`] or a coerced [`Value`] out of the `raw` cell.
    #[must_use]
    pub fn new(raw: &str, coerce: bool) -> Self {
        if coerce {
            Self::coerce(raw)
        } else {
            Self::Text(raw.to_owned())
        }
    }

    /// Returns the text of a [`Value::Text`].
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the number of a [`Value::Integer`].
    #[must_use]
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the number of a [`Value::Float`] or a [`Value::Integer`].
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            #[allow(clippy::cast_precision_loss)]
            Self::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Returns the boolean of a [`Value::Bool`].
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

/// Header to [`Value`] mapping, keeping the column order.
pub type Record = LinkedHashMap<String, Value>;

/// Kind of a [`Shape`].
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum ShapeKind {
    /// [`Headerless`].
    #[display("headerless")]
    Headerless,

    /// [`Horizontal`].
    #[display("horizontal")]
    Horizontal,

    /// [`Vertical`].
    #[display("vertical")]
    Vertical,

    /// [`Matrix`].
    #[display("matrix")]
    Matrix,
}

/// Process-wide defaults of whether cells are coerced, per [`ShapeKind`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, SmartDefault)]
pub struct CoercionDefaults {
    /// Default of [`Headerless`] tables.
    #[default(false)]
    pub headerless: bool,

    /// Default of [`Horizontal`] tables.
    #[default(true)]
    pub horizontal: bool,

    /// Default of [`Vertical`] tables.
    #[default(true)]
    pub vertical: bool,

    /// Default of [`Matrix`] tables.
    #[default(true)]
    pub matrix: bool,
}

impl CoercionDefaults {
    /// Returns the default of the given [`ShapeKind`].
    #[must_use]
    pub const fn get(&self, kind: ShapeKind) -> bool {
        match kind {
            ShapeKind::Headerless => self.headerless,
            ShapeKind::Horizontal => self.horizontal,
            ShapeKind::Vertical => self.vertical,
            ShapeKind::Matrix => self.matrix,
        }
    }

    /// Sets the default of the given [`ShapeKind`].
    pub fn set(&mut self, kind: ShapeKind, coerce: bool) {
        match kind {
            ShapeKind::Headerless => self.headerless = coerce,
            ShapeKind::Horizontal => self.horizontal = coerce,
            ShapeKind::Vertical => self.vertical = coerce,
            ShapeKind::Matrix => self.matrix = coerce,
        }
    }
}

/// Process-wide [`CoercionDefaults`].
static COERCION: Lazy<RwLock<CoercionDefaults>> = Lazy::new(RwLock::default);

/// Returns the current process-wide [`CoercionDefaults`].
#[must_use]
pub fn coercion_defaults() -> CoercionDefaults {
    *COERCION.read().unwrap_or_else(PoisonError::into_inner)
}

/// Overrides the process-wide coercion default of the given [`ShapeKind`].
pub fn set_coercion_default(kind: ShapeKind, coerce: bool) {
    COERCION.write().unwrap_or_else(PoisonError::into_inner).set(kind, coerce);
}

/// Per-call options of shaping a table.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct TableOptions {
    /// Whether cells are coerced.
    ///
    /// [`None`] falls back to the process-wide [`CoercionDefaults`].
    pub coerce: Option<bool>,
}

impl TableOptions {
    /// Creates [`TableOptions`] forcing the given coercion.
    #[must_use]
    pub const fn coerce(coerce: bool) -> Self {
        Self { coerce: Some(coerce) }
    }

    /// Resolves whether cells of the given [`ShapeKind`] are coerced.
    #[must_use]
    pub fn resolve(self, kind: ShapeKind) -> bool {
        self.coerce.unwrap_or_else(|| coercion_defaults().get(kind))
    }
}

/// Shape a raw table may be read in.
#[sealed]
pub trait Shape {
    /// [`ShapeKind`] of this [`Shape`].
    const KIND: ShapeKind;

    /// Shaped table.
    type Output;

    /// Shapes the raw `rows`.
    ///
    /// # Errors
    ///
    /// If the `rows` don't fit this [`Shape`].
    fn build(rows: &[Vec<String>], coerce: bool) -> Result<Self::Output, TableError>;
}

/// Table without headers.
#[derive(Clone, Copy, Debug)]
pub enum Headerless {}

/// Table with its first row being a header.
#[derive(Clone, Copy, Debug)]
pub enum Horizontal {}

/// Table with its first column being a header.
#[derive(Clone, Copy, Debug)]
pub enum Vertical {}

/// Table with both its first row and first column being headers.
#[derive(Clone, Copy, Debug)]
pub enum Matrix {}

#[sealed]
impl Shape for Headerless {
    const KIND: ShapeKind = ShapeKind::Headerless;
    type Output = Vec<Vec<Value>>;

    fn build(rows: &[Vec<String>], coerce: bool) -> Result<Self::Output, TableError> {
        Ok(rows
            .iter()
            .map(|r| r.iter().map(|c| Value::new(c, coerce)).collect())
            .collect())
    }
}

#[sealed]
impl Shape for Horizontal {
    const KIND: ShapeKind = ShapeKind::Horizontal;
    type Output = Vec<Record>;

    fn build(rows: &[Vec<String>], coerce: bool) -> Result<Self::Output, TableError> {
        let (header, body) =
            rows.split_first().ok_or(TableError::Empty { shape: "horizontal" })?;

        body.iter()
            .enumerate()
            .map(|(i, row)| {
                check_width(i + 1, header.len(), row)?;
                Ok(header
                    .iter()
                    .zip(row)
                    .map(|(h, c)| (h.clone(), Value::new(c, coerce)))
                    .collect())
            })
            .collect()
    }
}

#[sealed]
impl Shape for Vertical {
    const KIND: ShapeKind = ShapeKind::Vertical;
    type Output = Record;

    fn build(rows: &[Vec<String>], coerce: bool) -> Result<Self::Output, TableError> {
        if rows.is_empty() {
            return Err(TableError::Empty { shape: "vertical" });
        }

        rows.iter()
            .enumerate()
            .map(|(i, row)| {
                check_width(i, 2, row)?;
                Ok((row[0].clone(), Value::new(&row[1], coerce)))
            })
            .collect()
    }
}

#[sealed]
impl Shape for Matrix {
    const KIND: ShapeKind = ShapeKind::Matrix;
    type Output = LinkedHashMap<String, Record>;

    fn build(rows: &[Vec<String>], coerce: bool) -> Result<Self::Output, TableError> {
        let (header, body) =
            rows.split_first().ok_or(TableError::Empty { shape: "matrix" })?;
        let columns = header.get(1..).unwrap_or_default();

        body.iter()
            .enumerate()
            .map(|(i, row)| {
                check_width(i + 1, header.len(), row)?;
                let (key, cells) = row
                    .split_first()
                    .ok_or(TableError::Empty { shape: "matrix" })?;
                let record = columns
                    .iter()
                    .zip(cells)
                    .map(|(h, c)| (h.clone(), Value::new(c, coerce)))
                    .collect();
                Ok((key.clone(), record))
            })
            .collect()
    }
}

/// Checks the `row` to have exactly `expected` cells.
fn check_width(
    index: usize,
    expected: usize,
    row: &[String],
) -> Result<(), TableError> {
    if row.len() == expected {
        Ok(())
    } else {
        Err(TableError::Ragged { row: index, expected, found: row.len() })
    }
}

/// Shapes the raw `rows` as `S`, resolving coercion with the given
/// [`TableOptions`].
///
/// # Errors
///
/// If the `rows` don't fit the `S` [`Shape`].
pub fn shape<S: Shape>(
    rows: &[Vec<String>],
    options: TableOptions,
) -> Result<S::Output, TableError> {
    S::build(rows, options.resolve(S::KIND))
}
