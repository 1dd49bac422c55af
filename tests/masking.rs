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


use spx_eval::mask::{cut_by_mask, exclude_masked, MASK_COLOUR};
use spx_eval::prelude::*;

fn grid(rows: &[&[i32]]) -> LabelGrid {
  let (height, width) = (rows.len(), rows[0].len());
  LabelGrid::from_vec(width, height, rows.concat()).unwrap()
}

#[test]
fn masks_from_colours() {
  let data = nd::Array3::from_shape_vec((1, 3, 3), vec![16, 128, 128, 16, 0, 0, 200, 128, 128]).unwrap();
  let image = ColourGrid::from_array(data).unwrap();

  let mask = ExclusionMask::from_colour(&image, MASK_COLOUR);
  assert_eq!(mask.count(), 1);
  assert!(mask.is_masked(0));
  assert_eq!(mask.dims(), (3, 1));

  let mask = ExclusionMask::from_luma(&image, 16);
  assert_eq!(mask.count(), 2);
  assert!(!mask.is_masked(2));
}

#[test]
fn greyscale_masks_use_luma() {
  let image = ColourGrid::from_array(nd::Array3::from_elem((2, 2, 1), 16u8)).unwrap();
  assert_eq!(ExclusionMask::from_colour(&image, MASK_COLOUR).count(), 0);
  assert_eq!(ExclusionMask::from_luma(&image, 16).count(), 4);
}

#[test]
fn excluding_counts_new_exclusions() {
  let mut labels = grid(&[&[0, 0, 1, -1]]);
  let mask = ExclusionMask::from_fn(4, 1, |p| p >= 2);
  assert_eq!(exclude_masked(&mut labels, &mask).unwrap(), 1);
  assert_eq!(labels, grid(&[&[0, 0, -1, -1]]));
  assert_eq!(exclude_masked(&mut labels, &mask).unwrap(), 0);
}

#[test]
fn excluding_checks_dimensions() {
  let mut labels = LabelGrid::new(4, 2);
  let mask = ExclusionMask::from_fn(2, 4, |_| true);
  assert!(matches!(exclude_masked(&mut labels, &mask), Err(EvalError::DimensionMismatch { .. })));
  assert!(cut_by_mask(&mut labels, &mask).is_err());
  assert_eq!(labels, LabelGrid::new(4, 2));
}

#[test]
fn cutting_separates_regions_along_mask() {
  let mut labels = LabelGrid::new(4, 3);
  let mask = ExclusionMask::from_fn(4, 3, |p| p % 4 == 1);
  assert_eq!(cut_by_mask(&mut labels, &mask).unwrap(), 3);

  let masked = labels.at(1);
  assert!((0..12).filter(|&p| p % 4 == 1).all(|p| labels.at(p) == masked));
  assert!((0..12).filter(|&p| p % 4 != 1).all(|p| labels.at(p) != masked));
  assert_ne!(labels.at(0), labels.at(2));
  assert_eq!(labels.valid_pixels(), 12);
}

#[test]
fn cutting_splits_disjoint_mask_pieces() {
  let mut labels = LabelGrid::new(3, 3);
  let mask = ExclusionMask::from_fn(3, 3, |p| p == 1 || p == 7);
  assert_eq!(cut_by_mask(&mut labels, &mask).unwrap(), 3);
  assert_ne!(labels.at(1), labels.at(7));
  assert_eq!(labels.at(0), labels.at(8));
}

#[test]
fn masked_evaluation_ignores_masked_pixels() {
  let labels = grid(&[&[0, 0, 1, 1]]);
  let gt = GroundTruth::Labels(grid(&[&[0, 0, 0, 1]]));
  let mask = ExclusionMask::from_fn(4, 1, |p| p == 2);
  let metric = EvaluationBuilder::new(MetricKind::UndersegmentationError).build().unwrap();

  let unmasked = metric.evaluate(EvalInput::new(labels.clone()).with_ground_truth(&gt)).unwrap();
  assert_eq!(unmasked.score, 0.25);
  let masked = metric.evaluate(EvalInput::new(labels).with_ground_truth(&gt).with_mask(&mask)).unwrap();
  assert_eq!(masked.score, 0.0);
}
