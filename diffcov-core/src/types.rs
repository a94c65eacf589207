//! Value types shared by the coverage model, the registry and the scanner.
//!
//! All types are fully owned and `Send` so scan results can cross from
//! worker threads into the registry.

use serde::{Deserialize, Serialize};

use crate::range::LineRange;

/// Hierarchy level of a coverage node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementType {
    Method,
    Class,
    SourceFile,
    Package,
    Bundle,
    Group,
}

impl std::fmt::Display for ElementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ElementType::Method => "METHOD",
            ElementType::Class => "CLASS",
            ElementType::SourceFile => "SOURCEFILE",
            ElementType::Package => "PACKAGE",
            ElementType::Bundle => "BUNDLE",
            ElementType::Group => "GROUP",
        };
        f.write_str(name)
    }
}

/// The counter channels every node carries.
///
/// Branch, line, method and class each have a diff twin; instruction and
/// complexity do not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CounterEntity {
    Instruction,
    Branch,
    DiffBranch,
    Line,
    DiffLine,
    Complexity,
    Method,
    DiffMethod,
    Class,
    DiffClass,
}

impl CounterEntity {
    pub const ALL: [CounterEntity; 10] = [
        CounterEntity::Instruction,
        CounterEntity::Branch,
        CounterEntity::DiffBranch,
        CounterEntity::Line,
        CounterEntity::DiffLine,
        CounterEntity::Complexity,
        CounterEntity::Method,
        CounterEntity::DiffMethod,
        CounterEntity::Class,
        CounterEntity::DiffClass,
    ];

    /// The diff twin of this channel, if it has one.
    pub const fn diff_twin(self) -> Option<CounterEntity> {
        match self {
            CounterEntity::Branch => Some(CounterEntity::DiffBranch),
            CounterEntity::Line => Some(CounterEntity::DiffLine),
            CounterEntity::Method => Some(CounterEntity::DiffMethod),
            CounterEntity::Class => Some(CounterEntity::DiffClass),
            _ => None,
        }
    }
}

/// Content-hash identity of one method declaration in one revision.
///
/// Two fingerprints describe the same unchanged method iff their
/// `content_hash` values are equal. Name and parameters are for display.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MethodFingerprint {
    /// Qualified enclosing type, e.g. `org.acme.Outer$1`.
    pub enclosing_class_path: String,
    pub method_name: String,
    /// Literal rendering of each parameter declaration, in order.
    pub parameter_signatures: Vec<String>,
    /// Hex digest of the method's normalized full text.
    pub content_hash: String,
    /// Whether the method is declared inside an anonymous type.
    pub is_anonymous_class: bool,
}

impl std::fmt::Display for MethodFingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}#{}({})",
            self.enclosing_class_path,
            self.method_name,
            self.parameter_signatures.join(", ")
        )
    }
}

/// Diff data for one changed source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassInfo {
    /// Slash-separated class name, e.g. `org/acme/Foo`.
    pub class_identifier: String,
    /// Source path relative to the source root, e.g. `org/acme/Foo.java`.
    pub source_file_identifier: String,
    pub changed_methods: Vec<MethodFingerprint>,
    /// Sorted, pairwise disjoint changed ranges in new-revision numbering.
    pub line_ranges: Vec<LineRange>,
}

impl ClassInfo {
    pub fn new(
        class_identifier: impl Into<String>,
        source_file_identifier: impl Into<String>,
        changed_methods: Vec<MethodFingerprint>,
        line_ranges: Vec<LineRange>,
    ) -> Self {
        Self {
            class_identifier: class_identifier.into(),
            source_file_identifier: source_file_identifier.into(),
            changed_methods,
            line_ranges,
        }
    }

    /// Number of changed lines across all ranges.
    pub fn changed_line_count(&self) -> u32 {
        self.line_ranges.iter().map(LineRange::len).sum()
    }
}
