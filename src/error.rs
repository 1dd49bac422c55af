/*
  Copyright© 2023 Raúl Wolters(1)

  This file is part of spx-eval.

  spx-eval is free software: you can redistribute it and/or modify it under
  the terms of the European Union Public License version 1.2 or later, as
  published by the European Commission.

  spx-eval is distributed in the hope that it will be useful, but WITHOUT ANY
  WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR
  A PARTICULAR PURPOSE. See the European Union Public License for more details.

  You should have received a copy of the EUPL in an/all official language(s) of
  the European Union along with spx-eval.  If not, see
  <https://ec.europa.eu/info/european-union-public-licence_en/>.

  (1) Resident of the Kingdom of the Netherlands; agreement between licensor and
  licensee subject to Dutch law as per article 15 of the EUPL.
*/

//! Error type shared by every fallible operation in this crate.
//!
//! Precondition violations (mismatched grid sizes, labels below the exclusion
//! sentinel, nonsensical parameters) and I/O failures are reported through
//! [`EvalError`]. Broken internal invariants are not: those panic.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EvalError {
  /// Two grids that have to be evaluated together differ in size
  #[error("dimension mismatch: expected {}x{}, got {}x{}", .expected.0, .expected.1, .actual.0, .actual.1)]
  DimensionMismatch { expected: (usize, usize), actual: (usize, usize) },

  /// A label grid contains a value below the exclusion sentinel (-1)
  #[error("invalid label {label} at pixel {index}")]
  InvalidLabel { index: usize, label: i64 },

  /// A configuration value is out of its allowed range
  #[error("invalid parameter: {0}")]
  InvalidParameter(String),

  /// A metric was asked to run without one of the grids it needs
  #[error("missing input: {0}")]
  MissingInput(&'static str),

  #[error("could not access {path:?}: {source}")]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("could not decode or encode {path:?}: {source}")]
  Image {
    path: PathBuf,
    #[source]
    source: image::ImageError,
  },

  /// Malformed delimited-text label grid
  #[error("{path:?}, line {line}: {message}")]
  Parse { path: PathBuf, line: usize, message: String },

  /// The grid cannot be stored in the requested output format
  #[error("cannot represent grid in output format: {0}")]
  Unrepresentable(String),
}

/// Result type for fallible evaluation operations
pub type EvalResult<T> = Result<T, EvalError>;
