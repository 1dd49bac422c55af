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


use spx_eval::queue::{NodeState, PriorityQueue, RemovalPolicy};

fn drain<P: PartialOrd + Copy>(queue: &mut PriorityQueue<P>) -> Vec<usize> {
  std::iter::from_fn(|| queue.pop()).collect()
}

#[test]
fn pops_in_priority_order() {
  let mut queue = PriorityQueue::with_priorities(vec![5, 3, 9, 1, 7], RemovalPolicy::MinValue);
  (0..5).for_each(|n| queue.insert(n));
  assert_eq!(queue.len(), 5);
  assert_eq!(queue.peek(), Some(3));
  assert_eq!(drain(&mut queue), vec![3, 1, 0, 4, 2]);
  assert!(queue.is_empty());
  assert_eq!(queue.pop(), None);
}

#[test]
fn max_policy_reverses_order() {
  let mut queue = PriorityQueue::with_priorities(vec![5.0, 3.0, 9.0, 1.0], RemovalPolicy::MaxValue);
  (0..4).for_each(|n| queue.insert(n));
  assert_eq!(drain(&mut queue), vec![2, 0, 1, 3]);
}

#[test]
fn ties_pop_in_insertion_order() {
  let mut queue = PriorityQueue::new(6, 0u8, RemovalPolicy::MinValue);
  for node in [4, 1, 5, 0, 3, 2] {
    queue.insert(node);
  }
  assert_eq!(drain(&mut queue), vec![4, 1, 5, 0, 3, 2]);
}

#[test]
fn decrease_key_moves_node_forward() {
  let mut queue = PriorityQueue::with_priorities(vec![10, 20, 30], RemovalPolicy::MinValue);
  (0..3).for_each(|n| queue.insert(n));
  queue.decrease_key(2, 5);
  assert_eq!(queue.priority(2), 5);
  assert_eq!(drain(&mut queue), vec![2, 0, 1]);
}

#[test]
fn set_priority_sifts_both_ways() {
  let mut queue = PriorityQueue::with_priorities(vec![1, 2, 3, 4], RemovalPolicy::MinValue);
  (0..4).for_each(|n| queue.insert(n));
  queue.set_priority(0, 10);
  queue.set_priority(3, 0);
  assert_eq!(drain(&mut queue), vec![3, 1, 2, 0]);
}

#[test]
fn remove_marks_node_unvisited() {
  let mut queue = PriorityQueue::with_priorities(vec![1, 2, 3, 4, 5], RemovalPolicy::MinValue);
  (0..5).for_each(|n| queue.insert(n));
  queue.remove(0);
  queue.remove(3);
  assert_eq!(queue.state(0), NodeState::Unvisited);
  assert_eq!(queue.len(), 3);
  assert_eq!(drain(&mut queue), vec![1, 2, 4]);
  assert_eq!(queue.state(1), NodeState::Finalized);
}

#[test]
fn finalized_nodes_can_be_requeued() {
  let mut queue = PriorityQueue::new(3, 1, RemovalPolicy::MinValue);
  (0..3).for_each(|n| queue.insert(n));
  assert_eq!(queue.pop(), Some(0));
  assert_eq!(queue.state(0), NodeState::Finalized);
  //equal priority: the requeued node ranks behind the nodes already queued
  queue.insert(0);
  assert_eq!(drain(&mut queue), vec![1, 2, 0]);
}

#[test]
#[should_panic]
fn double_insert_panics() {
  let mut queue = PriorityQueue::new(2, 0, RemovalPolicy::MinValue);
  queue.insert(1);
  queue.insert(1);
}

#[test]
#[should_panic]
fn decrease_key_on_absent_node_panics() {
  let mut queue = PriorityQueue::new(2, 0, RemovalPolicy::MinValue);
  queue.decrease_key(1, -1);
}

#[test]
#[should_panic]
fn removing_absent_node_panics() {
  let mut queue = PriorityQueue::new(2, 0, RemovalPolicy::MinValue);
  queue.insert(0);
  queue.pop();
  queue.remove(0);
}
