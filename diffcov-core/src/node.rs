//! Generic hierarchical coverage node for levels above a single source file.
//!
//! A [`CoverageNode`] has no line array; its counters are the sum of its
//! children. Packages, bundles and groups are modelled with it.

use serde::{Deserialize, Serialize};

use crate::counter::Counter;
use crate::types::{CounterEntity, ElementType};

/// The ten counter channels of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CounterSet {
    pub instruction: Counter,
    pub branch: Counter,
    pub diff_branch: Counter,
    pub line: Counter,
    pub diff_line: Counter,
    pub complexity: Counter,
    pub method: Counter,
    pub diff_method: Counter,
    pub class: Counter,
    pub diff_class: Counter,
}

impl CounterSet {
    pub fn get(&self, entity: CounterEntity) -> Counter {
        match entity {
            CounterEntity::Instruction => self.instruction,
            CounterEntity::Branch => self.branch,
            CounterEntity::DiffBranch => self.diff_branch,
            CounterEntity::Line => self.line,
            CounterEntity::DiffLine => self.diff_line,
            CounterEntity::Complexity => self.complexity,
            CounterEntity::Method => self.method,
            CounterEntity::DiffMethod => self.diff_method,
            CounterEntity::Class => self.class,
            CounterEntity::DiffClass => self.diff_class,
        }
    }

    /// Adds every channel of `other` to this set.
    pub fn combine(&mut self, other: &CounterSet) {
        self.instruction = self.instruction.combine(other.instruction);
        self.branch = self.branch.combine(other.branch);
        self.diff_branch = self.diff_branch.combine(other.diff_branch);
        self.line = self.line.combine(other.line);
        self.diff_line = self.diff_line.combine(other.diff_line);
        self.complexity = self.complexity.combine(other.complexity);
        self.method = self.method.combine(other.method);
        self.diff_method = self.diff_method.combine(other.diff_method);
        self.class = self.class.combine(other.class);
        self.diff_class = self.diff_class.combine(other.diff_class);
    }
}

/// Read-only view of a node's coverage counters.
pub trait CoverageData {
    fn element_type(&self) -> ElementType;

    fn name(&self) -> &str;

    fn counters(&self) -> &CounterSet;

    fn counter(&self, entity: CounterEntity) -> Counter {
        self.counters().get(entity)
    }

    /// `true` when at least one instruction was recorded.
    fn contains_code(&self) -> bool {
        self.counters().instruction.total() != 0
    }

    /// Detached snapshot with identical counters and no line data.
    fn plain_copy(&self) -> CoverageNode {
        CoverageNode {
            element_type: self.element_type(),
            name: self.name().to_owned(),
            counters: *self.counters(),
        }
    }
}

/// Coverage node aggregated purely from its children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageNode {
    element_type: ElementType,
    name: String,
    counters: CounterSet,
}

impl CoverageNode {
    pub fn new(element_type: ElementType, name: impl Into<String>) -> Self {
        Self { element_type, name: name.into(), counters: CounterSet::default() }
    }

    /// Adds all counters of `child`, diff channels included.
    pub fn increment<C: CoverageData + ?Sized>(&mut self, child: &C) {
        self.counters.combine(child.counters());
    }

    /// Adds the counters of every child. Order does not matter.
    pub fn increment_all<'a, C, I>(&mut self, children: I)
    where
        C: CoverageData + 'a,
        I: IntoIterator<Item = &'a C>,
    {
        for child in children {
            self.increment(child);
        }
    }

    pub(crate) fn counters_mut(&mut self) -> &mut CounterSet {
        &mut self.counters
    }
}

impl CoverageData for CoverageNode {
    fn element_type(&self) -> ElementType {
        self.element_type
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn counters(&self) -> &CounterSet {
        &self.counters
    }
}

impl std::fmt::Display for CoverageNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} [{}]", self.name, self.element_type)
    }
}
