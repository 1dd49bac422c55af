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

//! Region merging.
//!
//! Both merge engines view a normalized label grid as a graph of regions. Each
//! region carries its pixel count, its per-channel colour sums and a row of an
//! adjacency matrix. Regions are merged greedily, smallest first, into the
//! adjacent region whose mean colour is closest. Merged regions are tracked
//! with a disjoint-set forest, so the label grid itself is only rewritten once
//! all merges have been decided.

use ndarray as nd;

use crate::{
  connectivity::normalize_connectivity,
  error::{EvalError, EvalResult},
  grid::{check_dims, neighbours_8con, ColourGrid, LabelGrid, EXCLUDED},
  mask::ExclusionMask,
  queue::{NodeState, PriorityQueue, RemovalPolicy},
};

////////////////////////////////////////////////////////////////////////////////
//                                DISJOINT SET                                //
////////////////////////////////////////////////////////////////////////////////

/// Union-find forest over the region ids `0..len`.
///
/// Unlike a rank-balanced union-find, [`attach`](DisjointSet::attach) always
/// makes the second argument the root: the merge engines rely on the target of
/// a merge keeping its id, since that is where its accumulators live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisjointSet {
  parent: Vec<usize>,
}

impl DisjointSet {
  /// Forest of `len` singleton sets
  pub fn new(len: usize) -> Self {
    DisjointSet { parent: (0..len).collect() }
  }

  #[inline]
  pub fn len(&self) -> usize {
    self.parent.len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.parent.is_empty()
  }

  #[inline]
  pub fn is_canonical(&self, x: usize) -> bool {
    self.parent[x] == x
  }

  /// Canonical id of the set containing `x`. Every node on the way is linked
  /// straight to the root.
  pub fn find(&mut self, mut x: usize) -> usize {
    let mut root = x;
    while self.parent[root] != root {
      root = self.parent[root];
    }
    while x != root {
      let next = self.parent[x];
      self.parent[x] = root;
      x = next;
    }
    root
  }

  /// Merges the set of `child` into the set of `root` and returns the
  /// canonical id of the union, which is the canonical id of `root`
  pub fn attach(&mut self, child: usize, root: usize) -> usize {
    let (child, root) = (self.find(child), self.find(root));
    if child != root {
      self.parent[child] = root;
    }
    root
  }

  /// Resolves every chain and returns the canonical id of each element
  pub fn flatten(&mut self) -> &[usize] {
    for x in 0..self.parent.len() {
      self.find(x);
    }
    &self.parent
  }
}

////////////////////////////////////////////////////////////////////////////////
//                                REGION GRAPH                                //
////////////////////////////////////////////////////////////////////////////////

/// Per-region statistics and adjacency of a normalized label grid.
///
/// Excluded pixels, and pixels under the optional exclusion mask, are left out
/// of every statistic and never make two regions adjacent.
#[derive(Debug, Clone)]
pub struct RegionGraph {
  sizes: Vec<usize>,
  //indexed (region, channel)
  colour_sums: nd::Array2<f64>,
  //indexed (region, region)
  adjacency: nd::Array2<bool>,
}

impl RegionGraph {
  /// Accumulates sizes, colour sums and 8-connected adjacency. Labels must be
  /// normalized.
  pub fn build(labels: &LabelGrid, colours: &ColourGrid, mask: Option<&ExclusionMask>) -> EvalResult<Self> {
    check_dims(labels.dims(), colours.dims())?;
    if let Some(mask) = mask {
      check_dims(labels.dims(), mask.dims())?;
    }
    let (width, height) = labels.dims();
    let count = labels.region_count();
    let counted = |p: usize| labels.at(p) != EXCLUDED && !mask.is_some_and(|m| m.is_masked(p));

    let mut graph = RegionGraph {
      sizes: vec![0; count],
      colour_sums: nd::Array2::zeros((count, 3)),
      adjacency: nd::Array2::from_elem((count, count), false),
    };

    for p in (0..labels.len()).filter(|&p| counted(p)) {
      let region = labels.at(p) as usize;
      graph.sizes[region] += 1;
      for (c, v) in colours.pixel(p).into_iter().enumerate() {
        graph.colour_sums[[region, c]] += v as f64;
      }
      for nb in neighbours_8con(p, width, height).filter(|&q| counted(q)) {
        let other = labels.at(nb) as usize;
        if other != region {
          graph.adjacency[[region, other]] = true;
          graph.adjacency[[other, region]] = true;
        }
      }
    }

    Ok(graph)
  }

  /// Number of regions the graph was built over, merged or not
  #[inline]
  pub fn region_count(&self) -> usize {
    self.sizes.len()
  }

  #[inline]
  pub fn size(&self, region: usize) -> usize {
    self.sizes[region]
  }

  pub fn sizes(&self) -> &[usize] {
    &self.sizes
  }

  /// Mean colour of `region`, zero if it has no counted pixels
  pub fn mean(&self, region: usize) -> [f64; 3] {
    let size = self.sizes[region].max(1) as f64;
    [0, 1, 2].map(|c| self.colour_sums[[region, c]] / size)
  }

  #[inline]
  pub fn adjacent(&self, a: usize, b: usize) -> bool {
    self.adjacency[[a, b]]
  }

  /// Squared euclidean distance between two mean colours
  pub fn distance(&self, a: usize, b: usize) -> f64 {
    let (ma, mb) = (self.mean(a), self.mean(b));
    ma.iter().zip(mb.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
  }

  /// Canonical neighbour of canonical `region` with the closest mean colour.
  /// Ties go to the neighbour found first when scanning the adjacency row in
  /// ascending id order. Entries that have come to point at `region` itself
  /// are cleared along the way.
  pub fn closest_neighbour(&mut self, region: usize, sets: &mut DisjointSet) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for j in 0..self.region_count() {
      if !self.adjacency[[region, j]] {
        continue;
      }
      let other = sets.find(j);
      if other == region {
        self.adjacency[[region, j]] = false;
        self.adjacency[[j, region]] = false;
        continue;
      }
      let distance = self.distance(region, other);
      if best.map_or(true, |(_, min)| distance < min) {
        best = Some((other, distance));
      }
    }
    best.map(|(other, _)| other)
  }

  /// Moves the statistics and neighbours of `child` into `target`
  pub fn absorb(&mut self, child: usize, target: usize) {
    self.sizes[target] += self.sizes[child];
    for c in 0..3 {
      self.colour_sums[[target, c]] += self.colour_sums[[child, c]];
    }
    self.adjacency[[target, child]] = false;
    self.adjacency[[child, target]] = false;
    for j in 0..self.region_count() {
      if j != target && j != child && self.adjacency[[child, j]] {
        self.adjacency[[target, j]] = true;
        self.adjacency[[j, target]] = true;
      }
    }
  }
}

////////////////////////////////////////////////////////////////////////////////
//                               MERGE ENGINES                                //
////////////////////////////////////////////////////////////////////////////////

/// Merges adjacent regions until at most `target` remain, and returns the
/// number of regions actually left.
///
/// Regions are visited smallest first and each is merged into the neighbour
/// with the closest mean colour. A region without neighbours cannot be merged,
/// so the result exceeds `target` when too many regions are isolated (for
/// instance by excluded pixels). The grid is normalized before and after.
pub fn reduce_to_count(labels: &mut LabelGrid, colours: &ColourGrid, target: usize) -> EvalResult<usize> {
  check_dims(labels.dims(), colours.dims())?;
  if target == 0 {
    return Err(EvalError::InvalidParameter("target region count must be at least 1".into()));
  }

  //(1) build the region graph
  let count = normalize_connectivity(labels);
  if count <= target {
    return Ok(count);
  }
  let mut graph = RegionGraph::build(labels, colours, None)?;
  let mut sets = DisjointSet::new(count);

  //(2) queue every region by size
  let mut queue = PriorityQueue::with_priorities(graph.sizes().to_vec(), RemovalPolicy::MinValue);
  (0..count).for_each(|region| queue.insert(region));

  //(3) merge until the target is reached or nothing can be merged anymore
  let mut remaining = count - target;
  while remaining > 0 {
    let Some(popped) = queue.pop() else { break };
    let region = sets.find(popped);
    let Some(into) = graph.closest_neighbour(region, &mut sets) else {
      continue;
    };
    sets.attach(region, into);
    graph.absorb(region, into);
    queue.set_priority(into, graph.size(into));
    remaining -= 1;
  }

  #[cfg(feature = "debug")]
  println!("reduced {count} regions with {} merges to go", remaining);

  //(4) write the merged labels back
  labels.recolour(sets.flatten());
  Ok(normalize_connectivity(labels))
}

/// Merges every region smaller than `min_size` pixels into its most similar
/// neighbour, and returns the resulting number of regions.
///
/// Pixels under `mask` count towards no region's size, colour or adjacency, but
/// keep (the merged version of) their label. Regions without any counted pixel
/// are left alone, as are small regions without neighbours.
pub fn merge_small_regions(
  labels: &mut LabelGrid,
  colours: &ColourGrid,
  min_size: usize,
  mask: Option<&ExclusionMask>,
) -> EvalResult<usize> {
  check_dims(labels.dims(), colours.dims())?;

  //(1) build the region graph and queue the small regions
  let count = normalize_connectivity(labels);
  let mut graph = RegionGraph::build(labels, colours, mask)?;
  let mut sets = DisjointSet::new(count);
  let mut queue = PriorityQueue::with_priorities(graph.sizes().to_vec(), RemovalPolicy::MinValue);
  for region in (0..count).filter(|&r| graph.size(r) > 0 && graph.size(r) < min_size) {
    queue.insert(region);
  }

  //(2) merge the smallest region until none is left under the threshold
  while let Some(popped) = queue.pop() {
    let region = sets.find(popped);
    if graph.size(region) >= min_size {
      continue;
    }
    let Some(into) = graph.closest_neighbour(region, &mut sets) else {
      continue;
    };
    sets.attach(region, into);
    graph.absorb(region, into);

    let size = graph.size(into);
    queue.set_priority(into, size);
    if size < min_size {
      if queue.state(into) == NodeState::Queued {
        queue.remove(into);
      }
      queue.insert(into);
    }
  }

  //(3) write the merged labels back
  labels.recolour(sets.flatten());
  let merged = normalize_connectivity(labels);

  #[cfg(feature = "debug")]
  println!("merged regions under {min_size}px: {count} -> {merged}");

  Ok(merged)
}

/// Number of regions with `0 < area < threshold`
pub fn count_small_regions(labels: &LabelGrid, threshold: usize) -> usize {
  labels.region_areas().into_iter().filter(|&area| area > 0 && area < threshold).count()
}
