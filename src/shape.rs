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

//! Shape metrics: compactness and regularity of region sizes.

use std::f64::consts::PI;

use crate::grid::{LabelGrid, EXCLUDED};

/// Perimeter of every region, indexed by label: the number of pixel edges
/// between a region pixel and anything else. Image borders and excluded
/// neighbours count as boundary.
pub fn region_perimeters(labels: &LabelGrid) -> Vec<usize> {
  let (width, height) = labels.dims();
  let mut perimeters = vec![0usize; labels.region_count()];
  for p in 0..labels.len() {
    let label = labels.at(p);
    if label == EXCLUDED {
      continue;
    }
    let (x, y) = labels.coords(p);
    let differs = |nb: Option<i32>| nb.map_or(true, |other| other != label);
    let edges = [
      differs(if y > 0 { labels.get(x, y - 1) } else { None }),
      differs(if y + 1 < height { labels.get(x, y + 1) } else { None }),
      differs(if x > 0 { labels.get(x - 1, y) } else { None }),
      differs(if x + 1 < width { labels.get(x + 1, y) } else { None }),
    ];
    perimeters[label as usize] += edges.iter().filter(|&&e| e).count();
  }
  perimeters
}

/// Isoperimetric quotient `4 pi A / P^2` of every region, 0 for empty regions
pub fn isoperimetric_quotients(labels: &LabelGrid) -> Vec<f64> {
  labels
    .region_areas()
    .into_iter()
    .zip(region_perimeters(labels))
    .map(|(area, perimeter)| match (area, perimeter) {
      (0, _) | (_, 0) => 0.0,
      (a, p) => 4.0 * PI * a as f64 / (p * p) as f64,
    })
    .collect()
}

/// Area-weighted mean isoperimetric quotient over all valid pixels, 0 if there
/// are none
pub fn compactness(labels: &LabelGrid) -> f64 {
  let valid = labels.valid_pixels();
  if valid == 0 {
    return 0.0;
  }
  let weighted: f64 = labels
    .region_areas()
    .into_iter()
    .zip(isoperimetric_quotients(labels))
    .map(|(area, quotient)| area as f64 * quotient)
    .sum();
  weighted / valid as f64
}

/// Population standard deviation of the areas of all non-empty regions, 0 if
/// there are none
pub fn regularity(labels: &LabelGrid) -> f64 {
  let areas: Vec<f64> = labels.region_areas().into_iter().filter(|&a| a > 0).map(|a| a as f64).collect();
  if areas.is_empty() {
    return 0.0;
  }
  let n = areas.len() as f64;
  let mean = areas.iter().sum::<f64>() / n;
  (areas.iter().map(|a| (a - mean).powi(2)).sum::<f64>() / n).sqrt()
}
