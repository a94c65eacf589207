//! Source-level coverage node backed by a sparse, growable line array.
//!
//! Methods, classes and source files are modelled as [`SourceNode`]s. Lines
//! are addressed by `line_number - offset`; the array only ever grows, by
//! copying into a larger allocation, so it always spans every line number
//! ever passed to an increment call.

use std::sync::Arc;

use crate::counter::Counter;
use crate::error::{DiffError, DiffResult};
use crate::line::LineModel;
use crate::node::{CounterSet, CoverageData, CoverageNode};
use crate::range::{contains_line, LineRange};
use crate::registry::DiffRegistry;
use crate::types::ElementType;

/// Read-only view of a node that knows about source lines.
pub trait SourceData: CoverageData {
    /// First line with data, `None` if no line was ever touched.
    fn first_line(&self) -> Option<u32>;

    /// Last line with data, `None` if no line was ever touched.
    fn last_line(&self) -> Option<u32>;

    /// Coverage of line `nr`; [`LineModel::EMPTY`] for unknown lines.
    fn line(&self, nr: u32) -> LineModel;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceNode {
    node: CoverageNode,
    lines: Vec<Option<LineModel>>,
    /// Line number stored in `lines[0]`.
    offset: u32,
    source_file: Option<String>,
    diff_ranges: Option<Arc<[LineRange]>>,
}

impl SourceNode {
    pub fn new(element_type: ElementType, name: impl Into<String>) -> Self {
        Self {
            node: CoverageNode::new(element_type, name),
            lines: Vec::new(),
            offset: 0,
            source_file: None,
            diff_ranges: None,
        }
    }

    /// Creates a node whose diff ranges come from `registry`.
    ///
    /// Classes and source files are looked up by their own name, methods by
    /// the source file they live in.
    pub fn tracked(
        element_type: ElementType,
        name: impl Into<String>,
        source_file: Option<&str>,
        registry: &DiffRegistry,
    ) -> Self {
        let name = name.into();
        let key = match element_type {
            ElementType::Method => source_file,
            ElementType::Class | ElementType::SourceFile => Some(name.as_str()),
            _ => None,
        };
        let ranges = key.and_then(|key| registry.line_ranges(key));
        let mut node = Self::new(element_type, name).with_line_ranges(ranges);
        node.source_file = source_file.map(str::to_owned);
        node
    }

    /// Names the source file whose line space this node describes.
    #[must_use]
    pub fn with_source_file(mut self, source_file: impl Into<String>) -> Self {
        self.source_file = Some(source_file.into());
        self
    }

    /// Sets the changed ranges used to classify newly created lines.
    #[must_use]
    pub fn with_line_ranges(mut self, ranges: Option<Arc<[LineRange]>>) -> Self {
        self.diff_ranges = ranges;
        self
    }

    pub fn source_file(&self) -> Option<&str> {
        self.source_file.as_deref()
    }

    /// Makes sure the line array can hold lines `first..=last`.
    ///
    /// No-op if either bound is unknown. Existing lines keep their numbers
    /// when the array is reallocated.
    pub fn ensure_capacity(&mut self, first: Option<u32>, last: Option<u32>) {
        let (Some(first), Some(last)) = (first, last) else {
            return;
        };
        if first > last {
            return;
        }
        if self.lines.is_empty() {
            self.offset = first;
            self.lines = vec![None; (last - first) as usize + 1];
            return;
        }
        let current_last = self.offset + self.lines.len() as u32 - 1;
        let new_first = self.offset.min(first);
        let new_last = current_last.max(last);
        let new_len = (new_last - new_first) as usize + 1;
        if new_len > self.lines.len() {
            let shift = (self.offset - new_first) as usize;
            let mut grown = vec![None; new_len];
            grown[shift..shift + self.lines.len()].copy_from_slice(&self.lines);
            self.offset = new_first;
            self.lines = grown;
        }
    }

    /// Adds instructions and branches, attributed to `line` when known.
    ///
    /// The node's own instruction and branch counters are incremented whether
    /// or not a line is given.
    pub fn increment(&mut self, instructions: Counter, branches: Counter, line: Option<u32>) {
        if let Some(nr) = line {
            self.increment_line(instructions, branches, nr);
        }
        let counters = self.node.counters_mut();
        counters.instruction = counters.instruction.combine(instructions);
        counters.branch = counters.branch.combine(branches);
    }

    /// Adds all counters of `child`, replaying its lines into this node.
    ///
    /// The child must describe the same source file. Its lines are classified
    /// against this node's own diff ranges.
    ///
    /// # Errors
    ///
    /// Returns [`DiffError::StructuralViolation`] when the nodes name different
    /// source files, or when only one of them names a source file.
    pub fn increment_child(&mut self, child: &SourceNode) -> DiffResult<()> {
        match (self.source_file(), child.source_file()) {
            (Some(mine), Some(theirs)) if mine != theirs => {
                return Err(DiffError::structural(format!(
                    "cannot aggregate {} from {theirs} into {} from {mine}",
                    child.node, self.node
                )));
            }
            (Some(_), None) | (None, Some(_)) => {
                return Err(DiffError::structural(format!(
                    "cannot aggregate {} into {}: only one names a source file",
                    child.node, self.node
                )));
            }
            _ => {}
        }

        let from = child.counters();
        let counters = self.node.counters_mut();
        counters.instruction = counters.instruction.combine(from.instruction);
        counters.branch = counters.branch.combine(from.branch);
        counters.complexity = counters.complexity.combine(from.complexity);
        counters.method = counters.method.combine(from.method);
        counters.diff_method = counters.diff_method.combine(from.diff_method);
        counters.class = counters.class.combine(from.class);
        counters.diff_class = counters.diff_class.combine(from.diff_class);

        self.ensure_capacity(child.first_line(), child.last_line());
        for (index, slot) in child.lines.iter().enumerate() {
            if let Some(line) = slot {
                let nr = child.offset + index as u32;
                self.increment_line(line.instructions(), line.branches(), nr);
            }
        }
        Ok(())
    }

    /// Adds the decision complexity implied by a set of branches.
    pub fn increment_branch_complexity(&mut self, branches: Counter) {
        if branches.total() > 1 {
            let covered = branches.covered().saturating_sub(1);
            let missed = branches.total().saturating_sub(covered + 1);
            self.increment_complexity(Counter::new(missed, covered));
        }
    }

    pub fn increment_complexity(&mut self, complexity: Counter) {
        let counters = self.node.counters_mut();
        counters.complexity = counters.complexity.combine(complexity);
    }

    /// Counts this node as one method, covered if any instruction was hit.
    ///
    /// Each method also contributes one unit of complexity.
    pub fn increment_method(&mut self, is_diff: bool) {
        let counters = self.node.counters_mut();
        let base = if counters.instruction.covered() == 0 {
            Counter::MISSED_ONE
        } else {
            Counter::COVERED_ONE
        };
        counters.method = counters.method.combine(base);
        counters.complexity = counters.complexity.combine(base);
        if is_diff {
            counters.diff_method = counters.diff_method.combine(base);
        }
    }

    /// Counts this node as one class, covered if any method was hit.
    pub fn increment_class(&mut self, is_diff: bool) {
        let counters = self.node.counters_mut();
        let base = if counters.method.covered() > 0 {
            Counter::COVERED_ONE
        } else {
            Counter::MISSED_ONE
        };
        counters.class = counters.class.combine(base);
        if is_diff {
            counters.diff_class = counters.diff_class.combine(base);
        }
    }

    /// Iterates over `(line_number, line)` for every created line.
    pub fn lines(&self) -> impl Iterator<Item = (u32, LineModel)> + '_ {
        self.lines
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.map(|line| (self.offset + index as u32, line)))
    }

    fn increment_line(&mut self, instructions: Counter, branches: Counter, nr: u32) {
        self.ensure_capacity(Some(nr), Some(nr));
        let index = (nr - self.offset) as usize;
        // the diff flag is decided once, when the line is first created
        let current = match self.lines[index] {
            Some(line) => line,
            None => LineModel::new(self.in_diff_range(nr)),
        };
        let (updated, transition) = current.record(instructions, branches);
        self.lines[index] = Some(updated);

        let counters = self.node.counters_mut();
        counters.line = transition.apply(counters.line);
        if updated.is_diff_line() {
            counters.diff_line = transition.apply(counters.diff_line);
            counters.diff_branch = counters.diff_branch.combine(branches);
        }
    }

    fn in_diff_range(&self, nr: u32) -> bool {
        self.diff_ranges.as_deref().is_some_and(|ranges| contains_line(ranges, nr))
    }
}

impl CoverageData for SourceNode {
    fn element_type(&self) -> ElementType {
        self.node.element_type()
    }

    fn name(&self) -> &str {
        self.node.name()
    }

    fn counters(&self) -> &CounterSet {
        self.node.counters()
    }
}

impl SourceData for SourceNode {
    fn first_line(&self) -> Option<u32> {
        (!self.lines.is_empty()).then_some(self.offset)
    }

    fn last_line(&self) -> Option<u32> {
        (!self.lines.is_empty()).then(|| self.offset + self.lines.len() as u32 - 1)
    }

    fn line(&self, nr: u32) -> LineModel {
        nr.checked_sub(self.offset)
            .and_then(|index| self.lines.get(index as usize))
            .copied()
            .flatten()
            .unwrap_or(LineModel::EMPTY)
    }
}

impl std::fmt::Display for SourceNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.node.fmt(f)
    }
}
