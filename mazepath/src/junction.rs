use std::time::Instant;

use log::debug;

use crate::grid::{Coordinate, Direction, Grid, Overlay};

/// Index of a node in a [`JunctionGraph`]. Ids follow the row-major scan.
pub type NodeId = usize;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Edge {
    pub to: NodeId,
    /// Number of cells travelled along the corridor.
    pub weight: usize,
}

#[derive(Clone, Debug)]
pub struct Junction {
    pub location: Coordinate,
    pub edges: Vec<Edge>,
}

/// Sparse weighted graph of the cells where a maze turns, forks, ends or
/// touches the boundary, plus the two search endpoints.
#[derive(Clone, Debug)]
pub struct JunctionGraph {
    nodes: Vec<Junction>,
    lookup: Overlay<Option<NodeId>>,
}

impl JunctionGraph {
    /// Scans `grid` row by row and links every junction to the nearest
    /// junction above it and to its left. Edges to junctions below or to the
    /// right are added when those junctions are scanned.
    pub fn compress(grid: &Grid, start: Coordinate, finish: Coordinate) -> Self {
        let started = Instant::now();
        let mut graph = JunctionGraph {
            nodes: Vec::new(),
            lookup: grid.create_overlay(None),
        };

        for current in grid.coordinates() {
            if !grid.is_open(current) || !is_junction(grid, current, start, finish) {
                continue;
            }
            let id = graph.nodes.len();
            graph.nodes.push(Junction {
                location: current,
                edges: Vec::new(),
            });
            *graph.lookup.get_mut(current) = Some(id);

            for direction in [Direction::Up, Direction::Left] {
                let mut offset = 1;
                let mut probe = grid.neighbor(current, direction);
                while let Some(p) = probe.filter(|p| grid.is_open(*p)) {
                    if let Some(other) = graph.lookup.get(p) {
                        graph.link(id, other, offset);
                        break;
                    }
                    offset += 1;
                    probe = grid.neighbor(p, direction);
                }
            }
        }

        debug!(
            "compressed {}x{} grid into {} junctions and {} edges in {:?}",
            grid.rows(),
            grid.columns(),
            graph.len(),
            graph.edge_count(),
            started.elapsed()
        );
        graph
    }

    fn link(&mut self, a: NodeId, b: NodeId, weight: usize) {
        self.nodes[a].edges.push(Edge { to: b, weight });
        self.nodes[b].edges.push(Edge { to: a, weight });
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.nodes.iter().map(|n| n.edges.len()).sum::<usize>() / 2
    }

    pub fn nodes(&self) -> &[Junction] {
        &self.nodes
    }

    pub fn node(&self, id: NodeId) -> &Junction {
        &self.nodes[id]
    }

    pub fn id_of(&self, location: Coordinate) -> Option<NodeId> {
        if !self.lookup.contains(location) {
            return None;
        }
        self.lookup.get(location)
    }

    pub fn contains(&self, location: Coordinate) -> bool {
        self.id_of(location).is_some()
    }

    /// Neighbouring junctions of `location` and the corridor length to each.
    pub fn neighbors(&self, location: Coordinate) -> impl Iterator<Item = (Coordinate, usize)> + '_ {
        self.id_of(location)
            .into_iter()
            .flat_map(move |id| self.nodes[id].edges.iter())
            .map(move |edge| (self.nodes[edge.to].location, edge.weight))
    }

    pub fn weight(&self, a: Coordinate, b: Coordinate) -> Option<usize> {
        self.neighbors(a).find(|(n, _)| *n == b).map(|(_, w)| w)
    }
}

/// Start, finish, boundary cells and every cell that is not the middle of a
/// straight one-wide corridor.
fn is_junction(grid: &Grid, c: Coordinate, start: Coordinate, finish: Coordinate) -> bool {
    if c == start || c == finish || grid.is_boundary(c) {
        return true;
    }
    let open = |direction| grid.neighbor(c, direction).is_some_and(|n| grid.is_open(n));
    let (up, down) = (open(Direction::Up), open(Direction::Down));
    let (left, right) = (open(Direction::Left), open(Direction::Right));

    let horizontal = left && right && !up && !down;
    let vertical = up && down && !left && !right;
    !horizontal && !vertical
}
