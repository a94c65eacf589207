//! Per-source-line coverage state and the line classification state machine.

use serde::{Deserialize, Serialize};

use crate::counter::{Counter, CounterStatus};

/// Classification of a line from its accumulated instruction counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineState {
    /// No instruction recorded yet.
    Empty,
    /// Instructions recorded, none covered.
    Uncovered,
    /// At least one instruction covered.
    Covered,
}

impl LineState {
    pub fn of(instructions: Counter) -> LineState {
        if instructions.total() == 0 {
            LineState::Empty
        } else if instructions.covered() == 0 {
            LineState::Uncovered
        } else {
            LineState::Covered
        }
    }
}

/// Effect of one instruction batch on the line counter of the enclosing node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineTransition {
    /// The line is counted exactly as before.
    Unchanged,
    /// First batch, nothing covered: `(+1, 0)`.
    EmptyToUncovered,
    /// First batch already covered: `(0, +1)`.
    EmptyToCovered,
    /// A later batch covers a line counted as missed: `(-1, +1)`.
    UncoveredToCovered,
}

impl LineTransition {
    /// Computes the transition caused by adding `batch` to a line whose
    /// instruction counter currently is `previous`.
    ///
    /// Batches without instructions never change the line's classification.
    pub fn between(previous: Counter, batch: Counter) -> LineTransition {
        if batch.total() == 0 {
            return LineTransition::Unchanged;
        }
        match (LineState::of(previous), batch.covered() > 0) {
            (LineState::Empty, false) => LineTransition::EmptyToUncovered,
            (LineState::Empty, true) => LineTransition::EmptyToCovered,
            (LineState::Uncovered, true) => LineTransition::UncoveredToCovered,
            (LineState::Uncovered, false) | (LineState::Covered, _) => LineTransition::Unchanged,
        }
    }

    /// Applies this transition to a line counter.
    #[must_use]
    pub fn apply(self, lines: Counter) -> Counter {
        match self {
            LineTransition::Unchanged => lines,
            LineTransition::EmptyToUncovered => lines.combine(Counter::MISSED_ONE),
            LineTransition::EmptyToCovered => lines.combine(Counter::COVERED_ONE),
            LineTransition::UncoveredToCovered => lines.adjust(-1, 1),
        }
    }
}

/// Coverage of a single source line.
///
/// The diff flag is decided when the line is first created and never
/// re-evaluated afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LineModel {
    instructions: Counter,
    branches: Counter,
    diff_line: bool,
}

impl LineModel {
    /// A line with no recorded instructions outside any changed region.
    pub const EMPTY: LineModel = LineModel::new(false);

    /// Creates an empty line with its diff flag frozen to `diff_line`.
    pub const fn new(diff_line: bool) -> Self {
        Self { instructions: Counter::ZERO, branches: Counter::ZERO, diff_line }
    }

    pub const fn instructions(&self) -> Counter {
        self.instructions
    }

    pub const fn branches(&self) -> Counter {
        self.branches
    }

    pub const fn is_diff_line(&self) -> bool {
        self.diff_line
    }

    pub fn state(&self) -> LineState {
        LineState::of(self.instructions)
    }

    /// Combined status of instructions and branches on this line.
    pub fn status(&self) -> CounterStatus {
        self.instructions.status().merge(self.branches.status())
    }

    /// Adds a batch of instructions and branches.
    ///
    /// Returns the updated line along with the transition the enclosing
    /// node has to apply to its line counters.
    #[must_use]
    pub fn record(self, instructions: Counter, branches: Counter) -> (LineModel, LineTransition) {
        let transition = LineTransition::between(self.instructions, instructions);
        let line = LineModel {
            instructions: self.instructions.combine(instructions),
            branches: self.branches.combine(branches),
            diff_line: self.diff_line,
        };
        (line, transition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_uncovered_batch_counts_a_missed_line() {
        let (line, t) = LineModel::new(false).record(Counter::new(3, 0), Counter::ZERO);
        assert_eq!(t, LineTransition::EmptyToUncovered);
        assert_eq!(line.state(), LineState::Uncovered);
        assert_eq!(t.apply(Counter::ZERO), Counter::MISSED_ONE);
    }

    #[test]
    fn first_covered_batch_counts_a_covered_line() {
        let (_, t) = LineModel::new(false).record(Counter::new(1, 2), Counter::ZERO);
        assert_eq!(t, LineTransition::EmptyToCovered);
        assert_eq!(t.apply(Counter::ZERO), Counter::COVERED_ONE);
    }

    #[test]
    fn later_coverage_moves_line_between_buckets() {
        let (line, first) = LineModel::new(true).record(Counter::new(2, 0), Counter::ZERO);
        let (line, second) = line.record(Counter::new(0, 1), Counter::new(1, 1));
        assert_eq!(second, LineTransition::UncoveredToCovered);
        assert_eq!(second.apply(first.apply(Counter::ZERO)), Counter::COVERED_ONE);
        assert_eq!(line.instructions(), Counter::new(2, 1));
        assert_eq!(line.branches(), Counter::new(1, 1));
        assert!(line.is_diff_line());
    }

    #[test]
    fn covered_line_stays_put() {
        let (line, _) = LineModel::EMPTY.record(Counter::new(0, 1), Counter::ZERO);
        let (_, t) = line.record(Counter::new(4, 0), Counter::ZERO);
        assert_eq!(t, LineTransition::Unchanged);
        let (_, t) = line.record(Counter::new(0, 4), Counter::ZERO);
        assert_eq!(t, LineTransition::Unchanged);
    }

    #[test]
    fn empty_batch_is_not_a_transition() {
        let (line, t) = LineModel::EMPTY.record(Counter::ZERO, Counter::new(1, 0));
        assert_eq!(t, LineTransition::Unchanged);
        assert_eq!(line.state(), LineState::Empty);
    }

    #[test]
    fn status_merges_branches() {
        let (line, _) = LineModel::EMPTY.record(Counter::new(0, 2), Counter::new(1, 1));
        assert_eq!(line.status(), CounterStatus::PartlyCovered);
        assert_eq!(LineModel::EMPTY.status(), CounterStatus::Empty);
    }
}
