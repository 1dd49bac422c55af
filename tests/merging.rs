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


use ndarray_rand::{rand_distr::Uniform, RandomExt};
use spx_eval::merge::{count_small_regions, DisjointSet, RegionGraph};
use spx_eval::prelude::*;
use spx_eval::{merge_small_regions, reduce_to_count};

//This constant determines the randomly generated label fields' sizes
const RF_SIZE: (usize, usize) = (24, 32);

fn grid(rows: &[&[i32]]) -> LabelGrid {
  let (height, width) = (rows.len(), rows[0].len());
  LabelGrid::from_vec(width, height, rows.concat()).unwrap()
}

fn grey(rows: &[&[u8]]) -> ColourGrid {
  let (height, width) = (rows.len(), rows[0].len());
  ColourGrid::from_array(nd::Array3::from_shape_vec((height, width, 1), rows.concat()).unwrap()).unwrap()
}

fn uniform(width: usize, height: usize) -> ColourGrid {
  ColourGrid::from_array(nd::Array3::from_elem((height, width, 3), 100)).unwrap()
}

fn random_input() -> (LabelGrid, ColourGrid) {
  let labels = nd::Array2::<i32>::random(RF_SIZE, Uniform::new(0, 4));
  let image = nd::Array3::<u8>::random((RF_SIZE.0, RF_SIZE.1, 3), Uniform::new(0, 255));
  (LabelGrid::from_array(labels).unwrap(), ColourGrid::from_array(image).unwrap())
}

////////////////////////////////////////////////////////////////////////////////
//                                DISJOINT SET                                //
////////////////////////////////////////////////////////////////////////////////

#[test]
fn attach_keeps_the_target_root() {
  let mut sets = DisjointSet::new(5);
  assert_eq!(sets.attach(0, 1), 1);
  assert_eq!(sets.attach(1, 2), 2);
  assert_eq!(sets.find(0), 2);
  assert_eq!(sets.attach(3, 0), 2);
  assert!(sets.is_canonical(2));
  assert!(!sets.is_canonical(0));
  assert_eq!(sets.flatten(), &[2, 2, 2, 2, 4]);
}

#[test]
fn region_graph_statistics() {
  let labels = grid(&[&[0, 0, 1], &[2, 2, 1]]);
  let image = grey(&[&[10, 30, 100], &[50, 50, 200]]);
  let graph = RegionGraph::build(&labels, &image, None).unwrap();
  assert_eq!(graph.sizes(), &[2, 2, 2]);
  assert_eq!(graph.mean(0), [20.0; 3]);
  assert_eq!(graph.mean(1), [150.0; 3]);
  assert!(graph.adjacent(0, 1) && graph.adjacent(1, 0));
  assert!(graph.adjacent(0, 2) && graph.adjacent(1, 2));
  assert!(!graph.adjacent(0, 0));
  assert_eq!(graph.distance(0, 2), 3.0 * 30.0 * 30.0);
}

#[test]
fn region_graph_skips_masked_pixels() {
  let labels = grid(&[&[0, 1, 1]]);
  let image = grey(&[&[10, 20, 30]]);
  let mask = ExclusionMask::from_fn(3, 1, |p| p == 1);
  let graph = RegionGraph::build(&labels, &image, Some(&mask)).unwrap();
  assert_eq!(graph.sizes(), &[1, 1]);
  assert_eq!(graph.mean(1), [30.0; 3]);
  assert!(!graph.adjacent(0, 1));
}

#[test]
fn region_graph_rejects_mismatched_grids() {
  let err = RegionGraph::build(&LabelGrid::new(3, 2), &uniform(2, 3), None).unwrap_err();
  assert!(matches!(err, EvalError::DimensionMismatch { expected: (3, 2), actual: (2, 3) }));
}

////////////////////////////////////////////////////////////////////////////////
//                              REDUCE TO COUNT                               //
////////////////////////////////////////////////////////////////////////////////

#[test]
fn reduce_small_regions_into_large_one() {
  //four single pixels that touch each other and the ring around them
  let mut labels = grid(&[&[4, 4, 4, 4], &[4, 0, 1, 4], &[4, 2, 3, 4], &[4, 4, 4, 4]]);
  let achieved = reduce_to_count(&mut labels, &uniform(4, 4), 2).unwrap();
  assert_eq!(achieved, 2);
  let mut areas = labels.region_areas();
  areas.sort();
  assert_eq!(areas, vec![1, 15]);
}

#[test]
fn reduce_merges_into_closest_colour() {
  let mut labels = grid(&[&[0, 0, 0, 0, 1, 2, 2, 2, 2]]);
  let image = grey(&[&[10, 10, 10, 10, 195, 200, 200, 200, 200]]);
  assert_eq!(reduce_to_count(&mut labels, &image, 2).unwrap(), 2);
  assert_eq!(labels.at(4), labels.at(5));
  assert_ne!(labels.at(4), labels.at(3));
}

#[test]
fn reduce_breaks_ties_by_lowest_id() {
  let mut labels = grid(&[&[0, 0, 1, 2, 2]]);
  let image = grey(&[&[50, 50, 100, 150, 150]]);
  assert_eq!(reduce_to_count(&mut labels, &image, 2).unwrap(), 2);
  assert_eq!(labels.at(2), labels.at(0));
}

#[test]
fn reduce_stalls_on_isolated_regions() {
  let mut labels = grid(&[&[0, 0, -1, 1, 1]]);
  assert_eq!(reduce_to_count(&mut labels, &uniform(5, 1), 1).unwrap(), 2);
  assert_eq!(labels.at(2), EXCLUDED);
}

#[test]
fn reduce_rejects_zero_target() {
  let mut labels = LabelGrid::new(2, 2);
  assert!(matches!(reduce_to_count(&mut labels, &uniform(2, 2), 0), Err(EvalError::InvalidParameter(_))));
}

#[test]
fn reduce_hits_target_on_connected_grids() {
  let (labels, image) = random_input();
  let mut normalized = labels.clone();
  let count = normalize_connectivity(&mut normalized);
  for target in [1, 5, count / 2, count, count + 3] {
    let mut merged = labels.clone();
    let achieved = reduce_to_count(&mut merged, &image, target.max(1)).unwrap();
    assert!(achieved <= count);
    assert_eq!(achieved, target.max(1).min(count));
    assert_eq!(merged.region_count(), achieved);
  }
}

#[test]
fn reduce_keeps_exclusions() {
  let rf = nd::Array2::<i32>::random(RF_SIZE, Uniform::new(-1, 4));
  let original = LabelGrid::from_array(rf).unwrap();
  let (_, image) = random_input();
  let mut labels = original.clone();
  let before = normalize_connectivity(&mut labels.clone());
  let achieved = reduce_to_count(&mut labels, &image, 3).unwrap();
  assert!(achieved <= before);
  for p in 0..labels.len() {
    assert_eq!(labels.at(p) == EXCLUDED, original.at(p) == EXCLUDED);
  }
}

////////////////////////////////////////////////////////////////////////////////
//                               MERGE BY SIZE                                //
////////////////////////////////////////////////////////////////////////////////

#[test]
fn small_region_joins_closest_neighbour() {
  let mut labels = grid(&[&[0, 0, 0, 0, 1, 2, 2, 2, 2]]);
  let image = grey(&[&[10, 10, 10, 10, 195, 200, 200, 200, 200]]);
  assert_eq!(merge_small_regions(&mut labels, &image, 2, None).unwrap(), 2);
  assert_eq!(labels.region_areas().iter().filter(|&&a| a == 5).count(), 1);
  assert_eq!(labels.at(4), labels.at(8));
}

#[test]
fn chains_of_small_regions_grow_past_threshold() {
  let mut labels = grid(&[&[0, 1, 2, 3, 4, 5]]);
  let count = merge_small_regions(&mut labels, &uniform(6, 1), 3, None).unwrap();
  assert!(count <= 2);
  assert_eq!(count_small_regions(&labels, 3), 0);
}

#[test]
fn masked_pixels_do_not_count_towards_size() {
  let labels = grid(&[&[0, 0, 1, 1], &[0, 0, 1, 1], &[0, 0, 1, 1], &[0, 0, 1, 1]]);
  let image = uniform(4, 4);
  let mask = ExclusionMask::from_fn(4, 4, |p| p % 4 == 3 || p == 10 || p == 14);

  let mut unmasked = labels.clone();
  assert_eq!(merge_small_regions(&mut unmasked, &image, 4, None).unwrap(), 2);

  let mut masked = labels.clone();
  assert_eq!(merge_small_regions(&mut masked, &image, 4, Some(&mask)).unwrap(), 1);
  assert!(masked.iter().all(|l| l == 0));
}

#[test]
fn no_small_regions_remain_on_connected_grids() {
  let (mut labels, image) = random_input();
  let before = normalize_connectivity(&mut labels.clone());
  let after = merge_small_regions(&mut labels, &image, 6, None).unwrap();
  assert!(after <= before);
  if after > 1 {
    assert_eq!(count_small_regions(&labels, 6), 0);
  }
}

#[test]
fn merge_keeps_exclusions() {
  let rf = nd::Array2::<i32>::random(RF_SIZE, Uniform::new(-1, 3));
  let original = LabelGrid::from_array(rf).unwrap();
  let (_, image) = random_input();
  let mut labels = original.clone();
  merge_small_regions(&mut labels, &image, 4, None).unwrap();
  for p in 0..labels.len() {
    assert_eq!(labels.at(p) == EXCLUDED, original.at(p) == EXCLUDED);
  }
}

#[test]
fn small_regions_are_counted() {
  let labels = grid(&[&[0, 0, 0, 1, 2, 2, -1]]);
  assert_eq!(count_small_regions(&labels, 3), 2);
  assert_eq!(count_small_regions(&labels, 1), 0);
}
