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

//! Exclusion masks.
//!
//! Ground-truth images often paint areas that should not be evaluated in a
//! reserved colour. An [`ExclusionMask`] marks those pixels; the label grid can
//! then either drop them from every statistic ([`exclude_masked`]) or be cut
//! along the mask outline ([`cut_by_mask`]).

use ndarray as nd;

use crate::{
  connectivity::normalize_connectivity,
  error::EvalResult,
  grid::{check_dims, ColourGrid, LabelGrid, EXCLUDED},
};

/// Reserved Y/Cb/Cr colour for "not evaluated" areas (black in studio swing)
pub const MASK_COLOUR: [u8; 3] = [16, 128, 128];

/// Per-pixel flag marking pixels that take no part in an evaluation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExclusionMask {
  data: nd::Array2<bool>,
}

impl ExclusionMask {
  /// Wraps an array of shape `(height, width)`
  pub fn from_array(data: nd::Array2<bool>) -> Self {
    ExclusionMask { data }
  }

  /// Masks every pixel for which `predicate(p)` holds
  pub fn from_fn<F>(width: usize, height: usize, mut predicate: F) -> Self
  where
    F: FnMut(usize) -> bool,
  {
    ExclusionMask { data: nd::Array2::from_shape_fn((height, width), |(y, x)| predicate(y * width + x)) }
  }

  /// Masks the pixels of `grid` whose three channels equal `colour`
  pub fn from_colour(grid: &ColourGrid, colour: [u8; 3]) -> Self {
    let (width, height) = grid.dims();
    Self::from_fn(width, height, |p| grid.pixel(p) == colour)
  }

  /// Masks the pixels of `grid` whose first (luma) channel equals `luma`
  pub fn from_luma(grid: &ColourGrid, luma: u8) -> Self {
    let (width, height) = grid.dims();
    Self::from_fn(width, height, |p| grid.pixel(p)[0] == luma)
  }

  /// (width, height)
  #[inline]
  pub fn dims(&self) -> (usize, usize) {
    (self.data.ncols(), self.data.nrows())
  }

  #[inline]
  pub fn is_masked(&self, p: usize) -> bool {
    let width = self.data.ncols();
    self.data[[p / width, p % width]]
  }

  /// Number of masked pixels
  pub fn count(&self) -> usize {
    self.data.iter().filter(|&&m| m).count()
  }

  pub fn view(&self) -> nd::ArrayView2<'_, bool> {
    self.data.view()
  }
}

/// Excludes every masked pixel and returns how many pixels were not excluded
/// before. Regions may fall apart; normalize afterwards.
pub fn exclude_masked(labels: &mut LabelGrid, mask: &ExclusionMask) -> EvalResult<usize> {
  check_dims(labels.dims(), mask.dims())?;
  let mut newly = 0;
  for p in (0..labels.len()).filter(|&p| mask.is_masked(p)) {
    if labels.at(p) != EXCLUDED {
      labels.set(p, EXCLUDED);
      newly += 1;
    }
  }
  Ok(newly)
}

/// Cuts every region along the outline of the mask, and turns the masked area
/// into regions of its own. Returns the new (normalized) region count.
pub fn cut_by_mask(labels: &mut LabelGrid, mask: &ExclusionMask) -> EvalResult<usize> {
  check_dims(labels.dims(), mask.dims())?;
  normalize_connectivity(labels);
  exclude_masked(labels, mask)?;
  let fresh = normalize_connectivity(labels) as i32;
  for p in (0..labels.len()).filter(|&p| mask.is_masked(p)) {
    labels.set(p, fresh);
  }
  //the masked area may consist of several pieces
  Ok(normalize_connectivity(labels))
}
