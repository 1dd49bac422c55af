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

//! Connected-component normalization of label grids.
//!
//! Superpixel algorithms frequently emit labels whose footprints are split into
//! several disconnected pieces, or whose ids have gaps. Every engine and metric
//! in this crate assumes that each label covers exactly one 8-connected group
//! of pixels and that the labels are the dense ids `0..K`. The functions in
//! this module establish and check that invariant.

use std::collections::HashSet;

use crate::grid::{neighbours_8con, LabelGrid, EXCLUDED};
use crate::queue::{NodeState, PriorityQueue, RemovalPolicy};

//Priorities of the flood fill. A pixel touched by an already-labelled
//neighbour with the same original label continues that neighbour's run, and
//must therefore be popped before any untouched pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
enum Touch {
  Seed,
  Touched,
  Untouched,
}

/// Relabels `labels` in place so that every 8-connected group of pixels that
/// share a label gets its own id, with ids numbered `0..K` in the order the
/// groups are first reached. Excluded pixels keep [`EXCLUDED`]. Returns `K`.
///
/// Call this before any other engine or metric, and again after anything that
/// may split a region (such as excluding masked pixels).
pub fn normalize_connectivity(labels: &mut LabelGrid) -> usize {
  if labels.is_empty() {
    return 0;
  }
  let (width, height) = labels.dims();
  let original = labels.clone();

  //(1) seed the flood fill at the first pixel
  let mut queue = PriorityQueue::new(labels.len(), Touch::Untouched, RemovalPolicy::MinValue);
  queue.set_priority(0, Touch::Seed);
  queue.insert(0);

  let mut next_label = 0;
  let mut run_label = EXCLUDED;

  //(2) every untouched pixel that comes off the queue starts a new run
  while let Some(px) = queue.pop() {
    let own = original.at(px);
    if own != EXCLUDED {
      if queue.priority(px) != Touch::Touched {
        run_label = next_label;
        next_label += 1;
      }
      labels.set(px, run_label);
    }

    for nb in neighbours_8con(px, width, height) {
      if queue.state(nb) == NodeState::Finalized {
        continue;
      }
      if own != EXCLUDED && original.at(nb) == own {
        match queue.state(nb) {
          NodeState::Queued => queue.decrease_key(nb, Touch::Touched),
          _ => queue.set_priority(nb, Touch::Touched),
        }
      }
      if queue.state(nb) == NodeState::Unvisited {
        queue.insert(nb);
      }
    }
  }

  #[cfg(feature = "debug")]
  println!("normalized {} pixels into {next_label} regions", labels.len());

  labels.region_count()
}

/// Number of distinct labels present in the grid, excluded pixels aside
pub fn count_regions(labels: &LabelGrid) -> usize {
  labels.iter().filter(|&label| label != EXCLUDED).collect::<HashSet<_>>().len()
}

/// `true` if the labels are the dense ids `0..K` and each of them covers a
/// single 8-connected group of pixels
pub fn is_normalized(labels: &LabelGrid) -> bool {
  let distinct = count_regions(labels);
  if distinct != labels.region_count() {
    return false;
  }
  let mut scratch = labels.clone();
  normalize_connectivity(&mut scratch) == distinct
}
