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


use std::path::PathBuf;

use spx_eval::colour::{rgb_to_ycbcr, ycbcr_to_rgb};
use spx_eval::io::{load_colour_grid, load_label_grid, save_colour_grid, save_label_grid};
use spx_eval::prelude::*;

fn temp_path(name: &str) -> PathBuf {
  std::env::temp_dir().join(format!("spx-eval-{}-{name}", std::process::id()))
}

#[test]
fn colour_conversion_constants() {
  assert_eq!(rgb_to_ycbcr([0, 0, 0]), [16, 128, 128]);
  assert_eq!(rgb_to_ycbcr([255, 255, 255]), [235, 128, 128]);
  assert_eq!(ycbcr_to_rgb([16, 128, 128]), [0, 0, 0]);
  assert_eq!(ycbcr_to_rgb([235, 128, 128]), [255, 255, 255]);
}

#[test]
fn read_delimited_labels() {
  let csv = temp_path("read.csv");
  std::fs::write(&csv, "0,0,1\n-1,2,1\n").unwrap();
  let labels = load_label_grid(&csv).unwrap();
  assert_eq!(labels.dims(), (3, 2));
  assert_eq!(labels.iter().collect::<Vec<_>>(), vec![0, 0, 1, -1, 2, 1]);

  let txt = temp_path("read.txt");
  std::fs::write(&txt, "0 0  1\n\n-1\t2 1\n").unwrap();
  assert_eq!(load_label_grid(&txt).unwrap(), labels);

  std::fs::remove_file(csv).unwrap();
  std::fs::remove_file(txt).unwrap();
}

#[test]
fn delimited_labels_survive_saving() {
  let labels = LabelGrid::from_vec(2, 3, vec![3, -1, 0, 0, 7, 12]).unwrap();
  for name in ["save.csv", "save.txt"] {
    let path = temp_path(name);
    save_label_grid(&labels, &path).unwrap();
    assert_eq!(load_label_grid(&path).unwrap(), labels);
    std::fs::remove_file(path).unwrap();
  }
}

#[test]
fn malformed_text_reports_line() {
  let path = temp_path("ragged.csv");
  std::fs::write(&path, "0,1,2\n0,1\n").unwrap();
  assert!(matches!(load_label_grid(&path), Err(EvalError::Parse { line: 2, .. })));

  std::fs::write(&path, "0,x\n").unwrap();
  assert!(matches!(load_label_grid(&path), Err(EvalError::Parse { line: 1, .. })));

  std::fs::write(&path, "0,-2\n").unwrap();
  assert!(matches!(load_label_grid(&path), Err(EvalError::InvalidLabel { index: 1, label: -2 })));
  std::fs::remove_file(path).unwrap();
}

#[test]
fn missing_file_is_io_error() {
  let path = temp_path("does-not-exist.csv");
  assert!(matches!(load_label_grid(&path), Err(EvalError::Io { .. })));
}

#[test]
fn raster_labels_survive_saving() {
  let labels = LabelGrid::from_array(nd::Array2::from_shape_fn((5, 7), |(y, x)| (300 * y + x) as i32)).unwrap();
  let path = temp_path("labels.png");
  save_label_grid(&labels, &path).unwrap();
  assert_eq!(load_label_grid(&path).unwrap(), labels);
  std::fs::remove_file(path).unwrap();
}

#[test]
fn rasters_cannot_hold_exclusions() {
  let labels = LabelGrid::from_vec(2, 1, vec![0, -1]).unwrap();
  let path = temp_path("excluded.png");
  assert!(matches!(save_label_grid(&labels, &path), Err(EvalError::Unrepresentable(_))));
  assert!(!path.exists());

  let labels = LabelGrid::from_vec(2, 1, vec![0, 70_000]).unwrap();
  assert!(matches!(save_label_grid(&labels, &path), Err(EvalError::Unrepresentable(_))));
}

#[test]
fn colour_grids_survive_saving() {
  let rgb = nd::Array3::from_shape_fn((4, 6, 3), |(y, x, _)| [0u8, 255][(x + y) % 2]);
  let grid = ColourGrid::from_rgb(rgb.view()).unwrap();
  let path = temp_path("colours.png");
  save_colour_grid(&grid, &path).unwrap();

  let loaded = load_colour_grid(&path).unwrap();
  assert_eq!(loaded.dims(), (6, 4));
  assert!(loaded.is_colour());
  assert_eq!(loaded.to_rgb(), rgb);
  std::fs::remove_file(path).unwrap();
}

#[cfg(feature = "plots")]
#[test]
fn plot_labels_and_scores() {
  use spx_eval::evaluation::score_map;
  use spx_eval::plotting::{plot_labels, plot_slice};
  use spx_eval::prelude::color_maps::{grey_scale, heat};

  let labels = LabelGrid::from_vec(4, 2, vec![0, 0, 1, 1, -1, 0, 1, 2]).unwrap();
  let labels_path = temp_path("labels-plot.png");
  plot_labels(&labels, &labels_path, heat).unwrap();
  assert!(labels_path.exists());

  let scores_path = temp_path("scores-plot.png");
  plot_slice(score_map(&labels, &[0.5, 1.0, 0.0]).view(), &scores_path, grey_scale).unwrap();
  assert_eq!(load_colour_grid(&scores_path).unwrap().dims(), (4, 2));

  std::fs::remove_file(labels_path).unwrap();
  std::fs::remove_file(scores_path).unwrap();
}
