use std::fmt::Display;

use crate::grid::{Coordinate, Direction};

/// Errors returned by maze extraction and the solvers.
///
/// A search that finds no route is not an error: it returns an empty
/// [`crate::StepLog`].
#[derive(thiserror::Error, Debug)]
pub enum MazeError {
    #[error("failed to decode maze image")]
    ImageDecode(#[from] image::ImageError),
    #[error("no maze detected: {0}")]
    NoMazeDetected(Detection),
    #[error("invalid endpoint {location}: {reason}")]
    InvalidEndpoint {
        location: Coordinate,
        reason: EndpointProblem,
    },
}

/// Which extraction measurement failed.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Detection {
    #[error("no stable border found scanning {0}")]
    BorderNotFound(Direction),
    #[error("border measurements enclose no pixels")]
    EmptyCrop,
    #[error("no corridor opening found along the maze edges")]
    NoCorridor,
    #[error("no wall band found in the sampled lines")]
    NoWall,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointProblem {
    OutOfBounds,
    Wall,
}

impl Display for EndpointProblem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                EndpointProblem::OutOfBounds => "outside the grid",
                EndpointProblem::Wall => "on a wall",
            }
        )
    }
}

impl From<Detection> for MazeError {
    fn from(detection: Detection) -> Self {
        MazeError::NoMazeDetected(detection)
    }
}

pub type Result<T> = std::result::Result<T, MazeError>;
