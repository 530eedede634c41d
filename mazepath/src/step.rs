use serde::{Deserialize, Serialize};

use crate::grid::{Cell, Coordinate};

/// One cell state change recorded during a search.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraversalStep {
    /// Position in the log; strictly increasing.
    pub order: usize,
    pub location: Coordinate,
    /// `None` for the start cell and for Dijkstra nodes recorded before the
    /// path is known.
    pub parent: Option<Coordinate>,
    pub cost_so_far: usize,
    /// Manhattan distance to the goal (A* only, 0 otherwise).
    pub heuristic: usize,
    pub state: Cell,
}

impl TraversalStep {
    pub fn total_cost(&self) -> usize {
        self.cost_so_far + self.heuristic
    }
}

/// Ordered record of a search, in discovery/finalization order.
///
/// An empty log means no path exists.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepLog {
    steps: Vec<TraversalStep>,
}

impl StepLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a step and returns the order it was given.
    pub(crate) fn record(
        &mut self,
        location: Coordinate,
        parent: Option<Coordinate>,
        cost_so_far: usize,
        heuristic: usize,
        state: Cell,
    ) -> usize {
        let order = self.steps.len();
        self.steps.push(TraversalStep {
            order,
            location,
            parent,
            cost_so_far,
            heuristic,
            state,
        });
        order
    }

    pub fn steps(&self) -> &[TraversalStep] {
        &self.steps
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TraversalStep> {
        self.steps.iter()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Locations tagged [`Cell::Path`], in the order they were emitted.
    pub fn path(&self) -> Vec<Coordinate> {
        self.steps
            .iter()
            .filter(|step| step.state == Cell::Path)
            .map(|step| step.location)
            .collect()
    }

    /// Number of moves along the path, or `None` when there is no path.
    pub fn path_cost(&self) -> Option<usize> {
        self.path().len().checked_sub(1)
    }

    pub fn count(&self, state: Cell) -> usize {
        self.steps.iter().filter(|step| step.state == state).count()
    }
}

impl<'a> IntoIterator for &'a StepLog {
    type Item = &'a TraversalStep;
    type IntoIter = std::slice::Iter<'a, TraversalStep>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.iter()
    }
}

impl IntoIterator for StepLog {
    type Item = TraversalStep;
    type IntoIter = std::vec::IntoIter<TraversalStep>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.into_iter()
    }
}
