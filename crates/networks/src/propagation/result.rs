use std::collections::{BTreeMap, HashMap};

use crate::point::Point;

/// Value recorded for one cell, with the number of decay steps it took.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reach {
    pub value: f32,
    pub steps: u32,
}

impl Reach {
    /// At least as strong and reached in no more steps.
    pub fn dominates(&self, other: &Reach) -> bool {
        self.value >= other.value && self.steps <= other.steps
    }
}

/// The non-dominated reaches of one cell, ordered by ascending steps and
/// therefore strictly ascending value. The last entry is the published one.
pub(crate) type Labels = Vec<Reach>;

/// Per-cell values of one connection. A missing cell is unreachable, which
/// is distinct from a reachable cell whose value decayed to 0.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropagationResult {
    pub(crate) cells: HashMap<Point, Labels>,
}

impl PropagationResult {
    pub fn get(&self, point: Point) -> Option<f32> {
        self.reach(point).map(|r| r.value)
    }

    /// The strongest reach of `point`, with the fewest steps among paths
    /// that deliver it.
    pub fn reach(&self, point: Point) -> Option<Reach> {
        self.cells.get(&point).and_then(|labels| labels.last()).copied()
    }

    pub fn contains(&self, point: Point) -> bool {
        self.cells.contains_key(&point)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Unordered iteration over `(point, value)`.
    pub fn iter(&self) -> impl Iterator<Item = (Point, f32)> + '_ {
        self.cells
            .iter()
            .filter_map(|(&p, labels)| labels.last().map(|r| (p, r.value)))
    }

    /// Values keyed by point in ascending order.
    pub fn values(&self) -> BTreeMap<Point, f32> {
        self.iter().collect()
    }

    /// Highest recorded value, if any cell is reachable.
    pub fn peak(&self) -> Option<f32> {
        self.iter().map(|(_, value)| value).reduce(f32::max)
    }
}

/// Why a propagation stopped before its frontier emptied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TruncationReason {
    /// Cells beyond `max_steps` decay steps were left unvisited.
    StepLimit { max_steps: u32 },
    /// The frontier still had work after `max_iterations` pops.
    IterationLimit { max_iterations: usize },
}

impl std::fmt::Display for TruncationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TruncationReason::StepLimit { max_steps } => {
                write!(f, "step limit of {max_steps} reached")
            }
            TruncationReason::IterationLimit { max_iterations } => {
                write!(f, "iteration limit of {max_iterations} reached")
            }
        }
    }
}

/// A propagation that stopped early. The partial result is still valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Truncation {
    pub reason: TruncationReason,
    /// Cells recorded when the propagation stopped.
    pub reached: usize,
}

/// Output of one engine run.
#[derive(Debug, Clone, Default)]
pub struct PropagationOutcome {
    pub result: PropagationResult,
    pub truncation: Option<Truncation>,
    /// Frontier pops performed.
    pub iterations: usize,
}

impl PropagationOutcome {
    pub fn is_truncated(&self) -> bool {
        self.truncation.is_some()
    }
}
