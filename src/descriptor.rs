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

//! Multi-modal colour descriptors of regions.
//!
//! A single mean colour describes a region with two distinct hues poorly. The
//! descriptor instead splits a region's pixels over a histogram and keeps the
//! mean colour of its `alpha` most populated buckets.
//!
//! Buckets are grouped by channel dominance. Pixels are first sorted into one
//! of seven groups according to which of their three channels are (jointly)
//! the largest, and then into one of `buckets` intensity bins of their first
//! largest channel.

use crate::{
  error::{EvalError, EvalResult},
  grid::{check_dims, ColourGrid, LabelGrid, EXCLUDED},
  queue::{PriorityQueue, RemovalPolicy},
};

//Number of channel-dominance groups: every non-empty subset of {Y, Cb, Cr}
const GROUPS: usize = 7;

/// The dominant colours of a region, ordered from most to least populated
/// bucket. Centroids are on the 8-bit scale of the input image.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RegionDescriptor {
  centroids: Vec<[f64; 3]>,
}

impl RegionDescriptor {
  pub fn centroids(&self) -> &[[f64; 3]] {
    &self.centroids
  }

  pub fn len(&self) -> usize {
    self.centroids.len()
  }

  pub fn is_empty(&self) -> bool {
    self.centroids.is_empty()
  }

  /// Per-channel mean of the centroids
  pub fn mean(&self) -> [f64; 3] {
    let n = self.centroids.len().max(1) as f64;
    let mut mean = [0.0; 3];
    for centroid in &self.centroids {
      (0..3).for_each(|c| mean[c] += centroid[c]);
    }
    mean.map(|m| m / n)
  }

  /// Per-channel maximum absolute deviation of any centroid from
  /// [`mean`](RegionDescriptor::mean)
  pub fn spread(&self) -> [f64; 3] {
    let mean = self.mean();
    let mut spread = [0.0f64; 3];
    for centroid in &self.centroids {
      (0..3).for_each(|c| spread[c] = spread[c].max((centroid[c] - mean[c]).abs()));
    }
    spread
  }

  /// Index of the centroid closest to `colour` (squared euclidean distance).
  /// The first of several equally close centroids wins.
  pub fn nearest(&self, colour: [f64; 3]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (idx, centroid) in self.centroids.iter().enumerate() {
      let distance: f64 = (0..3).map(|c| (colour[c] - centroid[c]).powi(2)).sum();
      if best.map_or(true, |(_, min)| distance < min) {
        best = Some((idx, distance));
      }
    }
    best.map(|(idx, _)| idx)
  }

  /// The same descriptor with every centroid divided by 255
  pub fn normalized(&self) -> RegionDescriptor {
    RegionDescriptor { centroids: self.centroids.iter().map(|c| c.map(|v| v / 255.0)).collect() }
  }
}

////////////////////////////////////////////////////////////////////////////////
//                                 HISTOGRAM                                  //
////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone)]
struct Histogram {
  buckets: usize,
  counts: Vec<usize>,
  sums: Vec<[f64; 3]>,
}

impl Histogram {
  fn new(buckets: usize) -> Self {
    Histogram { buckets, counts: vec![0; GROUPS * buckets], sums: vec![[0.0; 3]; GROUPS * buckets] }
  }

  fn clear(&mut self) {
    self.counts.iter_mut().for_each(|n| *n = 0);
    self.sums.iter_mut().for_each(|s| *s = [0.0; 3]);
  }

  #[inline]
  fn bucket_of(&self, px: [u8; 3]) -> usize {
    let [y, cb, cr] = px;
    //bit i is set if channel i is not (one of) the largest
    let mut group = 0usize;
    if y < cb || y < cr {
      group |= 1;
    }
    if cb < y || cb < cr {
      group |= 2;
    }
    if cr < y || cr < cb {
      group |= 4;
    }
    let channel = (group + 1).trailing_zeros() as usize;
    let bin = (px[channel] as f64 / 255.0 * self.buckets as f64).floor() as usize;
    group * self.buckets + bin.min(self.buckets - 1)
  }

  fn add(&mut self, px: [u8; 3]) {
    let bucket = self.bucket_of(px);
    self.counts[bucket] += 1;
    (0..3).for_each(|c| self.sums[bucket][c] += px[c] as f64);
  }

  fn top(&self, alpha: usize) -> RegionDescriptor {
    //(1) keep the alpha fullest buckets in a bounded min-queue
    let mut queue = PriorityQueue::with_priorities(self.counts.clone(), RemovalPolicy::MinValue);
    for bucket in (0..self.counts.len()).filter(|&b| self.counts[b] > 0) {
      if queue.len() < alpha {
        queue.insert(bucket);
      } else if queue.peek().is_some_and(|least| self.counts[least] < self.counts[bucket]) {
        queue.pop();
        queue.insert(bucket);
      }
    }

    //(2) the queue yields the smallest first, so fill from the back
    let mut centroids = vec![[0.0; 3]; queue.len()];
    for slot in (0..centroids.len()).rev() {
      let Some(bucket) = queue.pop() else { break };
      let n = self.counts[bucket] as f64;
      centroids[slot] = self.sums[bucket].map(|s| s / n);
    }
    RegionDescriptor { centroids }
  }
}

fn check_params(buckets: usize, alpha: usize) -> EvalResult<()> {
  if buckets == 0 {
    return Err(EvalError::InvalidParameter("need at least one bucket per channel".into()));
  }
  if alpha == 0 {
    return Err(EvalError::InvalidParameter("descriptor size alpha must be at least 1".into()));
  }
  Ok(())
}

////////////////////////////////////////////////////////////////////////////////
//                                DESCRIPTORS                                 //
////////////////////////////////////////////////////////////////////////////////

/// Descriptor of the pixels labelled `region`. A region without pixels gets an
/// empty descriptor.
pub fn describe_region(
  labels: &LabelGrid,
  colours: &ColourGrid,
  region: i32,
  buckets: usize,
  alpha: usize,
) -> EvalResult<RegionDescriptor> {
  check_dims(labels.dims(), colours.dims())?;
  check_params(buckets, alpha)?;
  let mut histogram = Histogram::new(buckets);
  (0..labels.len()).filter(|&p| labels.at(p) == region).for_each(|p| histogram.add(colours.pixel(p)));
  Ok(histogram.top(alpha))
}

/// Descriptors of all regions `0..labels.region_count()`, indexed by label
pub fn describe_regions(
  labels: &LabelGrid,
  colours: &ColourGrid,
  buckets: usize,
  alpha: usize,
) -> EvalResult<Vec<RegionDescriptor>> {
  check_dims(labels.dims(), colours.dims())?;
  check_params(buckets, alpha)?;

  //Group pixel ids by region so one histogram buffer can be reused
  let mut members: Vec<Vec<usize>> = vec![Vec::new(); labels.region_count()];
  for p in 0..labels.len() {
    let label = labels.at(p);
    if label != EXCLUDED {
      members[label as usize].push(p);
    }
  }

  let mut histogram = Histogram::new(buckets);
  Ok(
    members
      .iter()
      .map(|pixels| {
        histogram.clear();
        pixels.iter().for_each(|&p| histogram.add(colours.pixel(p)));
        histogram.top(alpha)
      })
      .collect(),
  )
}
