use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

pub mod dijkstra;
pub mod error;
pub mod find;
pub mod grid;
pub mod junction;
pub mod step;
pub mod util;

pub use error::{Detection, EndpointProblem, MazeError, Result};
pub use find::{AStar, SearchState};
pub use grid::{Cell, Coordinate, Direction, Grid, Overlay};
pub use junction::JunctionGraph;
pub use step::{StepLog, TraversalStep};
pub use util::{extract, Bounds, ExtractConfig, Extraction, MazeExtractor};

/// The search strategies [`solve`] can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Algorithm {
    /// A* ordered by cost plus Manhattan distance; always finds a shortest path.
    AStar,
    /// A* ordered by Manhattan distance alone.
    Greedy,
    DijkstraHeap,
    DijkstraLinear,
}

impl Algorithm {
    pub const ALL: [Algorithm; 4] = [
        Algorithm::AStar,
        Algorithm::Greedy,
        Algorithm::DijkstraHeap,
        Algorithm::DijkstraLinear,
    ];
}

impl Display for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Algorithm::AStar => "a*",
                Algorithm::Greedy => "greedy",
                Algorithm::DijkstraHeap => "dijkstra-heap",
                Algorithm::DijkstraLinear => "dijkstra-linear",
            }
        )
    }
}

impl FromStr for Algorithm {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "a*" | "astar" => Ok(Algorithm::AStar),
            "greedy" => Ok(Algorithm::Greedy),
            "dijkstra-heap" | "dijkstra" => Ok(Algorithm::DijkstraHeap),
            "dijkstra-linear" => Ok(Algorithm::DijkstraLinear),
            _ => Err(anyhow::anyhow!("Unknown algorithm: {}", s)),
        }
    }
}

/// Searches `grid` from `start` to `finish` with the chosen algorithm.
///
/// The grid is only read. When no route exists the returned log is empty.
pub fn solve(grid: &Grid, start: Coordinate, finish: Coordinate, algorithm: Algorithm) -> Result<StepLog> {
    match algorithm {
        Algorithm::AStar => find::search(grid, start, finish, false),
        Algorithm::Greedy => find::search(grid, start, finish, true),
        Algorithm::DijkstraHeap => dijkstra::search_heap(grid, start, finish),
        Algorithm::DijkstraLinear => dijkstra::search_linear(grid, start, finish),
    }
}
