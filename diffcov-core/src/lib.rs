//! Coverage model with a differential overlay.
//!
//! Execution counts reported per instruction are rolled up into line, method,
//! class and source-file counters. Every rollup carries a parallel "diff"
//! channel that only counts entities inside a changed region registered in the
//! [`DiffRegistry`]. The registry is populated once, up front, from a
//! two-revision comparison, then queried read-only by any number of
//! aggregation passes.

pub mod counter;
pub mod error;
pub mod line;
pub mod node;
pub mod range;
pub mod registry;
pub mod source;
pub mod types;

pub use counter::{Counter, CounterStatus};
pub use error::{DiffError, DiffResult};
pub use line::{LineModel, LineState, LineTransition};
pub use node::{CounterSet, CoverageData, CoverageNode};
pub use range::{contains_line, search_ranges, validate_ranges, LineRange};
pub use registry::DiffRegistry;
pub use source::{SourceData, SourceNode};
pub use types::{ClassInfo, CounterEntity, ElementType, MethodFingerprint};
