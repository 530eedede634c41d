//! Dijkstra over the [`JunctionGraph`] of a maze.
//!
//! Two frontiers are provided: a binary heap with lazy deletion and a plain
//! list scanned linearly. Both settle the unsettled node with the smallest
//! `(distance, node id)`, so for the same input they settle nodes in the same
//! order and produce identical step logs.

use std::{cmp::Reverse, collections::BinaryHeap, time::Instant};

use log::debug;

use crate::error::Result;
use crate::grid::{Cell, Coordinate, Direction, Grid};
use crate::junction::{JunctionGraph, NodeId};
use crate::step::StepLog;

const UNREACHABLE: usize = usize::MAX;

/// Chooses the next node to settle.
trait Frontier {
    /// Called whenever `node` gets a shorter tentative distance.
    fn push(&mut self, node: NodeId, distance: usize);

    /// The unsettled node with the smallest finite distance, if any.
    fn pop(&mut self, distance: &[usize], settled: &[bool]) -> Option<NodeId>;
}

#[derive(Debug, Default)]
struct HeapFrontier {
    heap: BinaryHeap<Reverse<(usize, NodeId)>>,
}

impl Frontier for HeapFrontier {
    fn push(&mut self, node: NodeId, distance: usize) {
        self.heap.push(Reverse((distance, node)));
    }

    fn pop(&mut self, distance: &[usize], settled: &[bool]) -> Option<NodeId> {
        while let Some(Reverse((d, node))) = self.heap.pop() {
            // skip entries superseded by a later improvement
            if settled[node] || d != distance[node] {
                continue;
            }
            return Some(node);
        }
        None
    }
}

#[derive(Debug)]
struct LinearFrontier {
    unsettled: Vec<NodeId>,
}

impl LinearFrontier {
    fn new(nodes: usize) -> Self {
        Self {
            unsettled: (0..nodes).collect(),
        }
    }
}

impl Frontier for LinearFrontier {
    fn push(&mut self, _node: NodeId, _distance: usize) {}

    fn pop(&mut self, distance: &[usize], _settled: &[bool]) -> Option<NodeId> {
        let mut best: Option<(usize, usize)> = None;
        let mut smallest = UNREACHABLE;
        for (position, &node) in self.unsettled.iter().enumerate() {
            if distance[node] < smallest {
                smallest = distance[node];
                best = Some((position, node));
            }
        }
        let (position, node) = best?;
        self.unsettled.remove(position);
        Some(node)
    }
}

/// Dijkstra with a binary heap frontier.
pub fn search_heap(grid: &Grid, start: Coordinate, finish: Coordinate) -> Result<StepLog> {
    run(grid, start, finish, |_| HeapFrontier::default())
}

/// Dijkstra that picks the next node by scanning every unsettled node.
pub fn search_linear(grid: &Grid, start: Coordinate, finish: Coordinate) -> Result<StepLog> {
    run(grid, start, finish, LinearFrontier::new)
}

fn run<F: Frontier>(
    grid: &Grid,
    start: Coordinate,
    finish: Coordinate,
    frontier: impl FnOnce(usize) -> F,
) -> Result<StepLog> {
    grid.check_endpoint(start)?;
    grid.check_endpoint(finish)?;

    let started = Instant::now();
    let graph = JunctionGraph::compress(grid, start, finish);
    let (Some(source), Some(target)) = (graph.id_of(start), graph.id_of(finish)) else {
        unreachable!("open endpoints are always junctions");
    };

    let mut frontier = frontier(graph.len());
    let mut distance = vec![UNREACHABLE; graph.len()];
    let mut previous: Vec<Option<NodeId>> = vec![None; graph.len()];
    let mut settled = vec![false; graph.len()];

    distance[source] = 0;
    frontier.push(source, 0);

    let mut log = StepLog::new();
    while let Some(current) = frontier.pop(&distance, &settled) {
        settled[current] = true;

        let state = if current == target {
            Cell::Finish
        } else if current == source {
            Cell::Start
        } else {
            Cell::Visited
        };
        log.record(graph.node(current).location, None, distance[current], 0, state);
        if current == target {
            break;
        }

        for edge in &graph.node(current).edges {
            if settled[edge.to] {
                continue;
            }
            let candidate = distance[current] + edge.weight;
            if candidate < distance[edge.to] {
                distance[edge.to] = candidate;
                previous[edge.to] = Some(current);
                frontier.push(edge.to, candidate);
            }
        }
    }

    debug!(
        "dijkstra from {} to {}: settled {} of {} junctions in {:?}",
        start,
        finish,
        settled.iter().filter(|s| **s).count(),
        graph.len(),
        started.elapsed()
    );

    if !settled[target] {
        return Ok(StepLog::new());
    }

    let cells = expand_path(&graph, &previous, target);
    debug_assert_eq!(cells.len() - 1, distance[target]);

    let total = cells.len() - 1;
    for (i, &cell) in cells.iter().enumerate() {
        log.record(cell, cells.get(i + 1).copied(), total - i, 0, Cell::Path);
    }
    Ok(log)
}

/// Every grid cell from `target` back to the source, walking each junction
/// edge one cell at a time.
fn expand_path(graph: &JunctionGraph, previous: &[Option<NodeId>], target: NodeId) -> Vec<Coordinate> {
    let mut cells = vec![graph.node(target).location];
    let mut node = target;
    while let Some(from) = previous[node] {
        let (mut pos, goal) = (graph.node(node).location, graph.node(from).location);
        let Some(direction) = Direction::between(pos, goal) else {
            panic!("junctions {} and {} are not on one corridor", pos, goal);
        };
        while pos != goal {
            pos = match pos.step(direction) {
                Some(next) => next,
                None => panic!("corridor from {} leaves the grid", pos),
            };
            cells.push(pos);
        }
        node = from;
    }
    cells
}
