//! Half-open line ranges and the disjoint-range membership test.

use serde::{Deserialize, Serialize};

use crate::error::{DiffError, DiffResult};

/// A `[begin, end)` range of 1-based line numbers in the new revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LineRange {
    pub begin: u32,
    pub end: u32,
}

impl LineRange {
    pub const fn new(begin: u32, end: u32) -> Self {
        Self { begin, end }
    }

    pub const fn contains(&self, line: u32) -> bool {
        self.begin <= line && line < self.end
    }

    pub const fn len(&self) -> u32 {
        self.end.saturating_sub(self.begin)
    }

    pub const fn is_empty(&self) -> bool {
        self.end <= self.begin
    }
}

impl std::fmt::Display for LineRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {})", self.begin, self.end)
    }
}

/// Binary search for `line` over sorted, pairwise disjoint ranges.
///
/// Returns `Ok(index)` of the range containing `line`, or `Err(insertion)`
/// with the position the line would sort at. Ranges are begin-inclusive and
/// end-exclusive; the result is only meaningful when [`validate_ranges`]
/// accepts the input.
pub fn search_ranges(ranges: &[LineRange], line: u32) -> Result<usize, usize> {
    let mut low = 0usize;
    let mut high = ranges.len();
    while low < high {
        let mid = low + (high - low) / 2;
        let range = ranges[mid];
        if line < range.begin {
            high = mid;
        } else if line >= range.end {
            low = mid + 1;
        } else {
            return Ok(mid);
        }
    }
    Err(low)
}

/// Returns `true` when one of the sorted, disjoint `ranges` contains `line`.
pub fn contains_line(ranges: &[LineRange], line: u32) -> bool {
    search_ranges(ranges, line).is_ok()
}

/// Checks that ranges are well formed, ascending and pairwise disjoint.
///
/// # Errors
///
/// Returns [`DiffError::StructuralViolation`] naming the first offending range.
pub fn validate_ranges(ranges: &[LineRange]) -> DiffResult<()> {
    for range in ranges {
        if range.end < range.begin {
            return Err(DiffError::structural(format!("inverted line range {range}")));
        }
    }
    for pair in ranges.windows(2) {
        if pair[1].begin < pair[0].end {
            return Err(DiffError::structural(format!(
                "line ranges {} and {} are unsorted or overlapping",
                pair[0], pair[1]
            )));
        }
    }
    Ok(())
}
