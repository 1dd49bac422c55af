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

//! Indexed binary heap with decrease-key and arbitrary removal.
//!
//! Every node of the graph being traversed (a pixel or a region) owns a slot in
//! the queue's priority array, whether or not it is currently queued. A
//! position index maps each queued node to its heap slot, so that changing the
//! priority of a queued node or removing it costs `O(log n)`.
//!
//! Nodes with equal priority leave the queue in the order they entered it.

/// Where a node stands with respect to the queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeState {
  /// never inserted, or removed with [`PriorityQueue::remove`]
  Unvisited,
  Queued,
  /// popped
  Finalized,
}

/// Which end of the ordering `pop` takes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RemovalPolicy {
  #[default]
  MinValue,
  MaxValue,
}

#[derive(Debug, Clone)]
pub struct PriorityQueue<P> {
  heap: Vec<usize>,
  position: Vec<usize>,
  priority: Vec<P>,
  stamp: Vec<u64>,
  state: Vec<NodeState>,
  next_stamp: u64,
  policy: RemovalPolicy,
}

impl<P> PriorityQueue<P>
where
  P: PartialOrd + Copy,
{
  /// Queue over `node_count` nodes, all unvisited with priority `initial`
  pub fn new(node_count: usize, initial: P, policy: RemovalPolicy) -> Self {
    Self::with_priorities(vec![initial; node_count], policy)
  }

  /// Queue over `priorities.len()` nodes, all unvisited
  pub fn with_priorities(priorities: Vec<P>, policy: RemovalPolicy) -> Self {
    let node_count = priorities.len();
    PriorityQueue {
      heap: Vec::with_capacity(node_count),
      position: vec![0; node_count],
      priority: priorities,
      stamp: vec![0; node_count],
      state: vec![NodeState::Unvisited; node_count],
      next_stamp: 0,
      policy,
    }
  }

  /// Number of queued nodes
  #[inline]
  pub fn len(&self) -> usize {
    self.heap.len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.heap.is_empty()
  }

  /// Number of nodes this queue tracks, queued or not
  #[inline]
  pub fn node_count(&self) -> usize {
    self.priority.len()
  }

  #[inline]
  pub fn state(&self, node: usize) -> NodeState {
    self.state[node]
  }

  #[inline]
  pub fn priority(&self, node: usize) -> P {
    self.priority[node]
  }

  /// Node that the next `pop` would return
  #[inline]
  pub fn peek(&self) -> Option<usize> {
    self.heap.first().copied()
  }

  /// Queues `node` with its current priority. Finalized nodes may be queued
  /// again; they then rank as the most recently inserted node among equals.
  ///
  /// # Panics
  /// if `node` is already queued
  pub fn insert(&mut self, node: usize) {
    assert!(self.state[node] != NodeState::Queued, "node {node} is already queued");
    self.stamp[node] = self.next_stamp;
    self.next_stamp += 1;
    self.state[node] = NodeState::Queued;
    self.position[node] = self.heap.len();
    self.heap.push(node);
    self.sift_up(self.heap.len() - 1);
  }

  /// Takes the highest-ranking node out of the queue and marks it finalized
  pub fn pop(&mut self) -> Option<usize> {
    let top = *self.heap.first()?;
    let last = self.heap.len() - 1;
    self.swap(0, last);
    self.heap.pop();
    if !self.heap.is_empty() {
      self.sift_down(0);
    }
    self.state[top] = NodeState::Finalized;
    Some(top)
  }

  /// Stores a new priority for `node`. If the node is queued, its heap slot is
  /// repaired in whichever direction the change requires.
  pub fn set_priority(&mut self, node: usize, value: P) {
    self.priority[node] = value;
    if self.state[node] == NodeState::Queued {
      self.restore(self.position[node]);
    }
  }

  /// Promotes a queued node to `value`.
  ///
  /// # Panics
  /// if `node` is not queued
  pub fn decrease_key(&mut self, node: usize, value: P) {
    assert!(self.state[node] == NodeState::Queued, "decrease-key on node {node}, which is not queued");
    self.set_priority(node, value);
  }

  /// Takes a queued node out of the queue and marks it unvisited.
  ///
  /// # Panics
  /// if `node` is not queued
  pub fn remove(&mut self, node: usize) {
    assert!(self.state[node] == NodeState::Queued, "cannot remove node {node}, which is not queued");
    let slot = self.position[node];
    let last = self.heap.len() - 1;
    self.swap(slot, last);
    self.heap.pop();
    if slot < self.heap.len() {
      self.restore(slot);
    }
    self.state[node] = NodeState::Unvisited;
  }

  ////////////////////////////////////////////////////////////////////////////
  //                             HEAP INTERNALS                             //
  ////////////////////////////////////////////////////////////////////////////

  //true if node a must leave the queue before node b
  #[inline]
  fn outranks(&self, a: usize, b: usize) -> bool {
    let (pa, pb) = (self.priority[a], self.priority[b]);
    let (first, second) = match self.policy {
      RemovalPolicy::MinValue => (pa < pb, pb < pa),
      RemovalPolicy::MaxValue => (pa > pb, pb > pa),
    };
    first || (!second && self.stamp[a] < self.stamp[b])
  }

  #[inline]
  fn swap(&mut self, i: usize, j: usize) {
    self.heap.swap(i, j);
    self.position[self.heap[i]] = i;
    self.position[self.heap[j]] = j;
  }

  fn restore(&mut self, slot: usize) {
    let node = self.heap[slot];
    self.sift_up(slot);
    self.sift_down(self.position[node]);
  }

  fn sift_up(&mut self, mut slot: usize) {
    while slot > 0 {
      let parent = (slot - 1) / 2;
      if !self.outranks(self.heap[slot], self.heap[parent]) {
        break;
      }
      self.swap(slot, parent);
      slot = parent;
    }
  }

  fn sift_down(&mut self, mut slot: usize) {
    let len = self.heap.len();
    loop {
      let (left, right) = (2 * slot + 1, 2 * slot + 2);
      let mut best = slot;
      if left < len && self.outranks(self.heap[left], self.heap[best]) {
        best = left;
      }
      if right < len && self.outranks(self.heap[right], self.heap[best]) {
        best = right;
      }
      if best == slot {
        break;
      }
      self.swap(slot, best);
      slot = best;
    }
  }
}
