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

//! Boundary adherence metrics: boundary recall and undersegmentation error.

use ndarray as nd;

use crate::{
  error::{EvalError, EvalResult},
  grid::{check_dims, neighbours_4con, LabelGrid, Partition, EXCLUDED},
};

/// Default boundary tolerance, as a fraction of the image diagonal
pub const DEFAULT_TOLERANCE: f64 = 0.0025;

/// `true` if some 4-neighbour `q` of `p` lies in a different cell of `grid`
/// while `labels[q]` is not excluded
pub fn is_boundary_pixel<P>(grid: &P, labels: &LabelGrid, p: usize) -> bool
where
  P: Partition + ?Sized,
{
  neighbours_4con(p, grid.width(), grid.height()).any(|q| !grid.same_cell(p, q) && labels.at(q) != EXCLUDED)
}

/// Boundary map of a partition, shape `(height, width)`
pub fn boundary_map<P>(grid: &P, labels: &LabelGrid) -> nd::Array2<bool>
where
  P: Partition + ?Sized,
{
  let (width, height) = (grid.width(), grid.height());
  nd::Array2::from_shape_fn((height, width), |(y, x)| is_boundary_pixel(grid, labels, y * width + x))
}

//Summed-area table over a boolean map: counts set cells in any rectangle in O(1)
struct SummedArea {
  table: nd::Array2<usize>,
}

impl SummedArea {
  fn new(map: nd::ArrayView2<bool>) -> Self {
    let (height, width) = map.dim();
    let mut table = nd::Array2::<usize>::zeros((height + 1, width + 1));
    for y in 0..height {
      for x in 0..width {
        table[[y + 1, x + 1]] = map[[y, x]] as usize + table[[y, x + 1]] + table[[y + 1, x]] - table[[y, x]];
      }
    }
    SummedArea { table }
  }

  //set cells in the inclusive rectangle [x0, x1] x [y0, y1]
  fn count(&self, (x0, y0): (usize, usize), (x1, y1): (usize, usize)) -> usize {
    self.table[[y1 + 1, x1 + 1]] + self.table[[y0, x0]] - self.table[[y0, x1 + 1]] - self.table[[y1 + 1, x0]]
  }
}

/// Fraction of ground-truth boundary pixels that have a boundary pixel of
/// `labels` within a square window of radius `round(d * diagonal)`.
///
/// Ground-truth boundary pixels that are excluded in `labels` are not counted.
/// Returns 0 if the ground truth has no (counted) boundary pixels.
pub fn boundary_recall<P>(labels: &LabelGrid, ground_truth: &P, d: f64) -> EvalResult<f64>
where
  P: Partition + ?Sized,
{
  check_dims(labels.dims(), (ground_truth.width(), ground_truth.height()))?;
  if !(d >= 0.0 && d.is_finite()) {
    return Err(EvalError::InvalidParameter(format!("boundary tolerance must be finite and >= 0, got {d}")));
  }
  let (width, height) = labels.dims();
  if labels.is_empty() {
    return Ok(0.0);
  }
  //no window needs to reach past the far edge of the image
  let r = ((d * ((height * height + width * width) as f64).sqrt()).round() as usize).min(width.max(height));

  //(1) index the predicted boundaries
  let predicted = SummedArea::new(boundary_map(labels, labels).view());

  //(2) look for a predicted boundary around every ground-truth boundary pixel
  let (mut tp, mut fneg) = (0usize, 0usize);
  for p in 0..labels.len() {
    if labels.at(p) == EXCLUDED || !is_boundary_pixel(ground_truth, labels, p) {
      continue;
    }
    let (x, y) = labels.coords(p);
    let lower = (x.saturating_sub(r), y.saturating_sub(r));
    let upper = ((x + r).min(width - 1), (y + r).min(height - 1));
    if predicted.count(lower, upper) > 0 {
      tp += 1;
    } else {
      fneg += 1;
    }
  }

  Ok(if tp + fneg > 0 { tp as f64 / (tp + fneg) as f64 } else { 0.0 })
}

/// Undersegmentation error: for every region, the number of its pixels that
/// fall outside the ground-truth segment it overlaps most, summed and divided
/// by the number of counted pixels.
///
/// Pixels excluded in either grid are ignored, and so are ground-truth
/// segments without any counted pixel. Returns 0 if no pixel is counted.
pub fn undersegmentation_error(labels: &LabelGrid, segments: &LabelGrid) -> EvalResult<f64> {
  check_dims(labels.dims(), segments.dims())?;

  //(1) intersection matrix, indexed (segment, region)
  let (regions, gt_count) = (labels.region_count(), segments.region_count());
  let mut intersection = nd::Array2::<usize>::zeros((gt_count, regions));
  let mut region_sizes = vec![0usize; regions];
  let mut gt_sizes = vec![0usize; gt_count];
  let mut valid = 0usize;
  for p in 0..labels.len() {
    let (region, segment) = (labels.at(p), segments.at(p));
    if region == EXCLUDED || segment == EXCLUDED {
      continue;
    }
    intersection[[segment as usize, region as usize]] += 1;
    region_sizes[region as usize] += 1;
    gt_sizes[segment as usize] += 1;
    valid += 1;
  }
  if valid == 0 {
    return Ok(0.0);
  }

  //(2) leakage of every region outside its best segment
  let error: usize = (0..regions)
    .filter(|&j| region_sizes[j] > 0)
    .map(|j| {
      (0..gt_count)
        .filter(|&i| gt_sizes[i] > 0)
        .map(|i| region_sizes[j] - intersection[[i, j]])
        .min()
        .unwrap_or(0)
    })
    .sum();

  Ok(error as f64 / valid as f64)
}
