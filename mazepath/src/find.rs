use std::{cmp::Ordering, collections::BinaryHeap, time::Instant};

use log::debug;

use crate::error::Result;
use crate::grid::{Cell, Coordinate, Grid, Overlay};
use crate::step::StepLog;

/// Cost of a cell that has not been reached yet.
const UNBOUNDED: usize = usize::MAX;

/// The objects that we store in the priority queue
#[derive(Debug)]
struct ToVisit {
    /// `cost + heuristic` when optimal, `heuristic` alone when greedy
    priority: usize,
    heuristic: usize,
    sequence: usize,
    point: Coordinate,
}

impl ToVisit {
    fn key(&self) -> (usize, usize, usize) {
        (self.priority, self.heuristic, self.sequence)
    }
}

impl Ord for ToVisit {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.key().cmp(&other.key()).reverse() // reverse for BinaryHeap to be a min-heap
    }
}

impl PartialOrd for ToVisit {
    fn partial_cmp(&self, other: &ToVisit) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for ToVisit {
    fn eq(&self, other: &ToVisit) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ToVisit {}

#[derive(Clone, Copy, Debug)]
struct Node {
    cost: usize,
    from: Option<Coordinate>,
    finalized: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchState {
    Computing,
    NoPathFound,
    PathFound { cost: usize },
}

impl SearchState {
    pub fn is_done(&self) -> bool {
        !matches!(self, SearchState::Computing)
    }
}

/// A* over a borrowed [`Grid`]. All search state lives in overlays owned by
/// the search, so several searches can share one grid.
#[derive(Debug)]
pub struct AStar<'g> {
    grid: &'g Grid,
    start: Coordinate,
    goal: Coordinate,
    greedy: bool,
    nodes: Overlay<Node>,
    visit_list: BinaryHeap<ToVisit>,
    sequence: usize,
    finalized: Vec<Coordinate>,
    state: SearchState,
}

impl<'g> AStar<'g> {
    /// Prepares a search from `start` to `goal`. With `greedy` the frontier
    /// is ordered by the heuristic alone.
    pub fn new(grid: &'g Grid, start: Coordinate, goal: Coordinate, greedy: bool) -> Result<Self> {
        grid.check_endpoint(start)?;
        grid.check_endpoint(goal)?;

        let mut nodes = grid.create_overlay(Node {
            cost: UNBOUNDED,
            from: None,
            finalized: false,
        });
        nodes.get_mut(start).cost = 0;

        let mut search = Self {
            grid,
            start,
            goal,
            greedy,
            nodes,
            visit_list: BinaryHeap::new(),
            sequence: 0,
            finalized: Vec::new(),
            state: SearchState::Computing,
        };
        search.push(start, 0);
        Ok(search)
    }

    fn heuristic(&self, point: Coordinate) -> usize {
        point.manhattan(self.goal)
    }

    fn push(&mut self, point: Coordinate, cost: usize) {
        let heuristic = self.heuristic(point);
        let priority = if self.greedy {
            heuristic
        } else {
            cost + heuristic
        };
        self.visit_list.push(ToVisit {
            priority,
            heuristic,
            sequence: self.sequence,
            point,
        });
        self.sequence += 1;
    }

    /// Runs the search to completion and returns its step log, which is
    /// empty when the goal cannot be reached.
    pub fn finish(mut self) -> StepLog {
        let started = Instant::now();
        while !self.step().is_done() {}
        debug!(
            "{} from {} to {}: {:?} after finalizing {} cells in {:?}",
            if self.greedy { "greedy a*" } else { "a*" },
            self.start,
            self.goal,
            self.state,
            self.finalized.len(),
            started.elapsed()
        );

        if !matches!(self.state, SearchState::PathFound { .. }) {
            return StepLog::new();
        }

        // backtrack from the goal to find the cells on the path
        let mut on_path = self.grid.create_overlay(false);
        let mut previous = Some(self.goal);
        while let Some(point) = previous {
            let node = self.nodes.get(point);
            if !node.finalized {
                panic!("Backtracking lead to a Point that was never visited");
            }
            *on_path.get_mut(point) = true;
            previous = node.from;
        }

        let mut log = StepLog::new();
        for &point in &self.finalized {
            let node = self.nodes.get(point);
            let state = if on_path.get(point) {
                Cell::Path
            } else {
                Cell::DeadEnd
            };
            log.record(point, node.from, node.cost, self.heuristic(point), state);
        }
        log
    }

    /// Pops one entry off the frontier. Stale entries for cells that were
    /// already finalized are skipped without changing the state.
    pub fn step(&mut self) -> SearchState {
        if self.state.is_done() {
            return self.state;
        }
        let Some(visit) = self.visit_list.pop() else {
            self.state = SearchState::NoPathFound;
            return self.state;
        };

        let node = self.nodes.get_mut(visit.point);
        if node.finalized {
            return self.state;
        }
        node.finalized = true;
        let cost = node.cost;
        self.finalized.push(visit.point);

        if visit.point == self.goal {
            self.state = SearchState::PathFound { cost };
            return self.state;
        }

        let grid = self.grid;
        for neighbor in grid.neighbors_of(visit.point) {
            let next = self.nodes.get_mut(neighbor);
            if next.finalized || cost + 1 >= next.cost {
                continue;
            }
            next.cost = cost + 1;
            next.from = Some(visit.point);
            self.push(neighbor, cost + 1);
        }

        self.state
    }

    pub fn state(&self) -> &SearchState {
        &self.state
    }

    pub fn start(&self) -> Coordinate {
        self.start
    }

    pub fn goal(&self) -> Coordinate {
        self.goal
    }
}

/// A* from `start` to `goal`; see [`AStar`].
pub fn search(grid: &Grid, start: Coordinate, goal: Coordinate, greedy: bool) -> Result<StepLog> {
    Ok(AStar::new(grid, start, goal, greedy)?.finish())
}

#[cfg(test)]
mod test {

    use std::collections::VecDeque;

    use super::*;
    use crate::error::MazeError;

    fn create_basic_map() -> Grid {
        [
            "#######", //
            "#.###.#", //
            "#.###.#", //
            "#.#...#", //
            "#.#.###", //
            "#......", //
            "#######", //
        ]
        .join("\n")
        .parse()
        .unwrap()
    }

    /// Shortest 4-connected distance by breadth-first search.
    fn bfs_distance(grid: &Grid, start: Coordinate, goal: Coordinate) -> Option<usize> {
        let mut distance = grid.create_overlay(None::<usize>);
        let mut queue = VecDeque::from([start]);
        *distance.get_mut(start) = Some(0);
        while let Some(point) = queue.pop_front() {
            let d = distance.get(point)?;
            if point == goal {
                return Some(d);
            }
            for n in grid.neighbors_of(point) {
                if distance.get(n).is_none() {
                    *distance.get_mut(n) = Some(d + 1);
                    queue.push_back(n);
                }
            }
        }
        None
    }

    #[test]
    fn test_basic_route() {
        let map = create_basic_map();

        let log = search(&map, Coordinate::new(1, 1), Coordinate::new(1, 5), false).unwrap();
        assert_eq!(log.path_cost(), Some(12));

        let path = log.path();
        assert_eq!(path.first(), Some(&Coordinate::new(1, 1)));
        assert_eq!(path.last(), Some(&Coordinate::new(1, 5)));
    }

    #[test]
    fn test_basic_no_route() {
        let base = create_basic_map();
        let mut rows: Vec<Vec<Cell>> = (0..base.rows()).map(|r| base.row(r).to_vec()).collect();
        // close the corridor between the two halves
        rows[3][3] = Cell::Wall;
        let map = Grid::from_rows(rows);

        for greedy in [false, true] {
            let log = search(&map, Coordinate::new(1, 1), Coordinate::new(1, 5), greedy).unwrap();
            assert!(log.is_empty());
        }
    }

    #[test]
    fn test_endpoint_on_wall() {
        let map = create_basic_map();
        assert!(matches!(
            AStar::new(&map, Coordinate::new(1, 1), Coordinate::new(0, 5), false),
            Err(MazeError::InvalidEndpoint { .. })
        ));
        assert!(matches!(
            search(&map, Coordinate::new(10, 1), Coordinate::new(1, 5), true),
            Err(MazeError::InvalidEndpoint { .. })
        ));
    }

    #[test]
    fn test_open_field_has_no_dead_ends() {
        let map = Grid::new(5, 5, Cell::Traversable);

        let log = search(&map, Coordinate::new(0, 0), Coordinate::new(4, 4), false).unwrap();
        assert_eq!(log.path().len(), 9);
        assert_eq!(log.count(Cell::DeadEnd), 0);
        assert_eq!(log.steps()[0].parent, None);
        assert_eq!(log.steps()[0].location, Coordinate::new(0, 0));
    }

    #[test]
    fn test_steps_in_finalization_order() {
        let map = create_basic_map();
        let log = search(&map, Coordinate::new(5, 6), Coordinate::new(1, 1), false).unwrap();

        for (i, step) in log.iter().enumerate() {
            assert_eq!(step.order, i);
            assert!(matches!(step.state, Cell::Path | Cell::DeadEnd));
            assert_eq!(step.heuristic, step.location.manhattan(Coordinate::new(1, 1)));
        }
        // the right-hand branch is explored but not used
        assert!(log.count(Cell::DeadEnd) > 0);
        assert_eq!(log.path_cost(), bfs_distance(&map, Coordinate::new(5, 6), Coordinate::new(1, 1)));
    }

    #[test]
    fn test_path_steps_link_to_parents() {
        let map = create_basic_map();
        let log = search(&map, Coordinate::new(1, 1), Coordinate::new(1, 5), false).unwrap();

        let path: Vec<_> = log.iter().filter(|s| s.state == Cell::Path).collect();
        for pair in path.windows(2) {
            assert_eq!(pair[1].parent, Some(pair[0].location));
            assert_eq!(pair[1].cost_so_far, pair[0].cost_so_far + 1);
        }
    }

    #[test]
    fn test_step_by_step() {
        let map = create_basic_map();
        let mut finder = AStar::new(&map, Coordinate::new(1, 1), Coordinate::new(3, 1), false).unwrap();

        assert_eq!(finder.step(), SearchState::Computing);
        let mut state = finder.step();
        while !state.is_done() {
            state = finder.step();
        }
        assert_eq!(state, SearchState::PathFound { cost: 2 });
        // further steps keep the final state
        assert_eq!(finder.step(), state);
        assert_eq!(finder.finish().path().len(), 3);
    }

    #[test]
    fn test_start_is_goal() {
        let map = create_basic_map();
        let log = search(&map, Coordinate::new(1, 1), Coordinate::new(1, 1), false).unwrap();
        assert_eq!(log.path(), vec![Coordinate::new(1, 1)]);
    }

    #[test]
    fn test_optimal_matches_bfs_on_every_small_grid() {
        let (rows, columns) = (3, 4);
        let start = Coordinate::new(0, 0);
        let goal = Coordinate::new(rows - 1, columns - 1);

        for mask in 0u32..(1 << (rows * columns)) {
            let cells = (0..rows * columns)
                .map(|i| {
                    if mask & (1 << i) != 0 {
                        Cell::Wall
                    } else {
                        Cell::Traversable
                    }
                })
                .collect();
            let grid = Grid::from_cells(rows, columns, cells);
            if !grid.is_open(start) || !grid.is_open(goal) {
                continue;
            }

            let expected = bfs_distance(&grid, start, goal);
            let optimal = search(&grid, start, goal, false).unwrap();
            assert_eq!(optimal.path_cost(), expected, "mask {:#b}", mask);

            // greedy is complete, but not necessarily shortest
            let greedy = search(&grid, start, goal, true).unwrap();
            assert_eq!(greedy.path_cost().is_some(), expected.is_some());
            if let (Some(g), Some(e)) = (greedy.path_cost(), expected) {
                assert!(g >= e);
            }
        }
    }

    #[test]
    fn test_greedy_takes_detour() {
        let map: Grid = [
            ".......", //
            ".#####.", //
            ".....#.", //
            "####.#.", //
            "####.#.", //
            "####...", //
        ]
        .join("\n")
        .parse()
        .unwrap();
        let (start, goal) = (Coordinate::new(2, 0), Coordinate::new(2, 6));

        let optimal = search(&map, start, goal, false).unwrap();
        let greedy = search(&map, start, goal, true).unwrap();
        assert_eq!(optimal.path_cost(), Some(10));
        assert_eq!(greedy.path_cost(), Some(12));
    }

    #[test]
    fn test_grid_is_not_modified() {
        let map = create_basic_map();
        let before = map.clone();
        search(&map, Coordinate::new(1, 1), Coordinate::new(1, 5), true).unwrap();
        assert_eq!(map, before);
    }
}
