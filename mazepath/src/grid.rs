use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::{EndpointProblem, MazeError};
use crate::step::StepLog;

/// State of a single maze cell.
///
/// Extraction only ever produces `Traversable` and `Wall`; the remaining
/// variants are search-time annotations carried by [`crate::TraversalStep`]s.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Cell {
    Traversable,
    Wall,
    Visited,
    DeadEnd,
    Path,
    Start,
    Finish,
}

impl Cell {
    pub fn is_wall(self) -> bool {
        self == Cell::Wall
    }

    pub fn is_open(self) -> bool {
        !self.is_wall()
    }
}

impl Default for Cell {
    fn default() -> Self {
        Self::Wall
    }
}

impl Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Cell::Traversable => " ",
                Cell::Wall => "X",
                Cell::Visited => "+",
                Cell::DeadEnd => "-",
                Cell::Path => "*",
                Cell::Start => "S",
                Cell::Finish => "F",
            }
        )
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Neighbor order used by every search: up, down, left, right.
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// The direction leading from `from` to `to` along a single row or column.
    pub fn between(from: Coordinate, to: Coordinate) -> Option<Direction> {
        if from == to {
            None
        } else if from.row == to.row {
            Some(if to.col > from.col {
                Direction::Right
            } else {
                Direction::Left
            })
        } else if from.col == to.col {
            Some(if to.row > from.row {
                Direction::Down
            } else {
                Direction::Up
            })
        } else {
            None
        }
    }
}

impl Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Direction::Up => "up",
                Direction::Down => "down",
                Direction::Left => "left",
                Direction::Right => "right",
            }
        )
    }
}

impl FromStr for Direction {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "up" => Ok(Direction::Up),
            "down" => Ok(Direction::Down),
            "left" => Ok(Direction::Left),
            "right" => Ok(Direction::Right),
            _ => Err(anyhow::anyhow!("Invalid direction: {}", s)),
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coordinate {
    pub row: usize,
    pub col: usize,
}

impl Coordinate {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// `|r1-r2| + |c1-c2|`
    pub fn manhattan(self, other: Coordinate) -> usize {
        self.row.abs_diff(other.row) + self.col.abs_diff(other.col)
    }

    /// The adjacent coordinate in `direction`, if it does not underflow.
    /// Callers check the upper bound against their grid.
    pub fn step(self, direction: Direction) -> Option<Coordinate> {
        match direction {
            Direction::Up => self.row.checked_sub(1).map(|row| Coordinate { row, ..self }),
            Direction::Down => Some(Coordinate {
                row: self.row + 1,
                ..self
            }),
            Direction::Left => self.col.checked_sub(1).map(|col| Coordinate { col, ..self }),
            Direction::Right => Some(Coordinate {
                col: self.col + 1,
                ..self
            }),
        }
    }
}

impl Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{}", self.row, self.col)
    }
}

impl FromStr for Coordinate {
    type Err = anyhow::Error;

    /// Parses `row,col`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (row, col) = s
            .split_once(',')
            .ok_or_else(|| anyhow::anyhow!("Invalid coordinate (expected row,col): {}", s))?;
        Ok(Coordinate {
            row: row.trim().parse()?,
            col: col.trim().parse()?,
        })
    }
}

/// Rectangular, row-major maze grid. Immutable once built: searches read it
/// and keep their own state in an [`Overlay`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Grid {
    rows: usize,
    columns: usize,
    cells: Vec<Cell>,
}

impl Grid {
    pub fn new(rows: usize, columns: usize, fill: Cell) -> Self {
        Self {
            rows,
            columns,
            cells: vec![fill; rows * columns],
        }
    }

    /// Builds a grid from row-major cells. Panics if `cells` does not hold
    /// exactly `rows * columns` entries.
    pub fn from_cells(rows: usize, columns: usize, cells: Vec<Cell>) -> Self {
        assert_eq!(
            cells.len(),
            rows * columns,
            "grid of {}x{} needs {} cells",
            rows,
            columns,
            rows * columns
        );
        Self {
            rows,
            columns,
            cells,
        }
    }

    /// Builds a grid from a vec of rows. Panics on ragged input.
    pub fn from_rows(rows: Vec<Vec<Cell>>) -> Self {
        let columns = rows.first().map_or(0, Vec::len);
        assert!(
            rows.iter().all(|row| row.len() == columns),
            "all grid rows must have the same length"
        );
        let height = rows.len();
        Self::from_cells(height, columns, rows.into_iter().flatten().collect())
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn contains(&self, c: Coordinate) -> bool {
        c.row < self.rows && c.col < self.columns
    }

    /// Flat `row * columns + col` index.
    pub fn index(&self, c: Coordinate) -> usize {
        c.row * self.columns + c.col
    }

    /// Panics if `c` is outside the grid.
    pub fn get(&self, c: Coordinate) -> Cell {
        assert!(self.contains(c), "{} is outside the grid", c);
        self.cells[self.index(c)]
    }

    pub fn cell(&self, c: Coordinate) -> Option<Cell> {
        self.contains(c).then(|| self.cells[self.index(c)])
    }

    /// In bounds and not a wall.
    pub fn is_open(&self, c: Coordinate) -> bool {
        self.cell(c).is_some_and(Cell::is_open)
    }

    pub fn row(&self, row: usize) -> &[Cell] {
        &self.cells[row * self.columns..(row + 1) * self.columns]
    }

    pub fn column(&self, col: usize) -> impl DoubleEndedIterator<Item = Cell> + '_ {
        (0..self.rows).map(move |row| self.cells[row * self.columns + col])
    }

    /// Every coordinate in row-major order.
    pub fn coordinates(&self) -> impl Iterator<Item = Coordinate> {
        let columns = self.columns;
        (0..self.rows).flat_map(move |row| (0..columns).map(move |col| Coordinate { row, col }))
    }

    pub fn is_boundary(&self, c: Coordinate) -> bool {
        c.row == 0 || c.col == 0 || c.row + 1 == self.rows || c.col + 1 == self.columns
    }

    pub fn neighbor(&self, c: Coordinate, direction: Direction) -> Option<Coordinate> {
        c.step(direction).filter(|n| self.contains(*n))
    }

    /// Open 4-connected neighbors of `c`, in [`Direction::ALL`] order.
    pub fn neighbors_of(&self, c: Coordinate) -> impl Iterator<Item = Coordinate> + '_ {
        Direction::ALL
            .into_iter()
            .filter_map(move |direction| self.neighbor(c, direction))
            .filter(move |n| self.is_open(*n))
    }

    /// Rejects endpoints that are outside the grid or on a wall.
    pub fn check_endpoint(&self, location: Coordinate) -> Result<(), MazeError> {
        match self.cell(location) {
            None => Err(MazeError::InvalidEndpoint {
                location,
                reason: EndpointProblem::OutOfBounds,
            }),
            Some(Cell::Wall) => Err(MazeError::InvalidEndpoint {
                location,
                reason: EndpointProblem::Wall,
            }),
            Some(_) => Ok(()),
        }
    }

    /// Open cells on the outer boundary, clockwise from the top-left corner.
    pub fn openings(&self) -> Vec<Coordinate> {
        if self.rows == 0 || self.columns == 0 {
            return Vec::new();
        }
        let (last_row, last_col) = (self.rows - 1, self.columns - 1);

        let mut ring: Vec<Coordinate> = (0..self.columns).map(|col| Coordinate::new(0, col)).collect();
        ring.extend((1..self.rows).map(|row| Coordinate::new(row, last_col)));
        if self.rows > 1 {
            ring.extend((0..last_col).rev().map(|col| Coordinate::new(last_row, col)));
        }
        if self.columns > 1 {
            ring.extend((1..last_row).rev().map(|row| Coordinate::new(row, 0)));
        }

        ring.retain(|c| self.is_open(*c));
        ring
    }

    /// A copy of this grid with every step of `log` applied in order.
    pub fn replay(&self, log: &StepLog) -> Grid {
        let mut snapshot = self.clone();
        for step in log {
            let i = snapshot.index(step.location);
            snapshot.cells[i] = step.state;
        }
        snapshot
    }

    /// Create per-search storage with one `value` per cell.
    pub fn create_overlay<T: Clone>(&self, value: T) -> Overlay<T> {
        Overlay {
            columns: self.columns,
            values: vec![value; self.rows * self.columns],
        }
    }
}

impl Display for Grid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for row in 0..self.rows {
            for cell in self.row(row) {
                write!(f, "{}", cell)?;
            }
            writeln!(f)?;
        }

        Ok(())
    }
}

impl FromStr for Grid {
    type Err = anyhow::Error;

    /// One line per row; `#` or `X` is a wall, `.` or a space is open.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut rows = Vec::new();
        for line in s.lines().map(|l| l.trim_end_matches('\r')) {
            if line.is_empty() {
                continue;
            }
            let row = line
                .chars()
                .map(|ch| match ch {
                    '#' | 'X' => Ok(Cell::Wall),
                    '.' | ' ' => Ok(Cell::Traversable),
                    _ => Err(anyhow::anyhow!("Invalid maze character: {:?}", ch)),
                })
                .collect::<Result<Vec<_>, _>>()?;
            rows.push(row);
        }

        if let Some(first) = rows.first() {
            if rows.iter().any(|row| row.len() != first.len()) {
                return Err(anyhow::anyhow!("maze rows have different lengths"));
            }
        }
        Ok(Grid::from_rows(rows))
    }
}

/// Per-search storage laid over a [`Grid`], one value per cell.
#[derive(Clone, Debug)]
pub struct Overlay<T> {
    columns: usize,
    values: Vec<T>,
}

impl<T: Copy> Overlay<T> {
    pub fn get(&self, c: Coordinate) -> T {
        self.values[c.row * self.columns + c.col]
    }
}

impl<T> Overlay<T> {
    pub fn contains(&self, c: Coordinate) -> bool {
        c.col < self.columns && c.row * self.columns + c.col < self.values.len()
    }

    pub fn get_mut(&mut self, c: Coordinate) -> &mut T {
        &mut self.values[c.row * self.columns + c.col]
    }
}
