//! Immutable `(missed, covered)` counter, the primitive every rollup is built from.
//!
//! The counter stores missed and covered items; `total` is derived. Storing the
//! two buckets separately keeps `covered <= total` true by construction and
//! lets a line move from the missed bucket to the covered bucket with a single
//! `(-1, +1)` adjustment.

use std::iter::Sum;
use std::ops::Add;

use serde::{Deserialize, Serialize};

/// Coverage status derived from a counter's buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CounterStatus {
    /// No items at all.
    Empty,
    /// Items exist but none is covered.
    NotCovered,
    /// Some items covered, some missed.
    PartlyCovered,
    /// Every item covered.
    FullyCovered,
}

impl CounterStatus {
    /// Merges the status of two counters describing the same entity
    /// (e.g. the instruction and branch counters of one line).
    pub fn merge(self, other: CounterStatus) -> CounterStatus {
        use CounterStatus::*;
        match (self, other) {
            (Empty, s) | (s, Empty) => s,
            (a, b) if a == b => a,
            _ => PartlyCovered,
        }
    }
}

/// A pair of missed/covered item counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Counter {
    missed: u32,
    covered: u32,
}

impl Counter {
    /// The canonical zero counter.
    pub const ZERO: Counter = Counter { missed: 0, covered: 0 };
    /// One missed item, the `(+1, 0)` delta.
    pub const MISSED_ONE: Counter = Counter { missed: 1, covered: 0 };
    /// One covered item, the `(0, +1)` delta.
    pub const COVERED_ONE: Counter = Counter { missed: 0, covered: 1 };

    pub const fn new(missed: u32, covered: u32) -> Self {
        Self { missed, covered }
    }

    /// Builds a counter from a total and the covered part of it.
    ///
    /// `covered` is clamped to `total`.
    pub fn from_total(total: u32, covered: u32) -> Self {
        let covered = covered.min(total);
        Self { missed: total - covered, covered }
    }

    pub const fn missed(&self) -> u32 {
        self.missed
    }

    pub const fn covered(&self) -> u32 {
        self.covered
    }

    pub const fn total(&self) -> u32 {
        self.missed.saturating_add(self.covered)
    }

    /// Component-wise sum of two counters.
    #[must_use]
    pub const fn combine(self, other: Counter) -> Counter {
        Counter {
            missed: self.missed.saturating_add(other.missed),
            covered: self.covered.saturating_add(other.covered),
        }
    }

    /// Applies a signed `(Δmissed, Δcovered)` adjustment.
    ///
    /// Buckets saturate at zero. The coverage model only ever issues
    /// `(-1, +1)` for a bucket that already holds the line being moved.
    #[must_use]
    pub fn adjust(self, delta_missed: i32, delta_covered: i32) -> Counter {
        Counter {
            missed: self.missed.saturating_add_signed(delta_missed),
            covered: self.covered.saturating_add_signed(delta_covered),
        }
    }

    /// Ratio of covered items, `None` for an empty counter.
    pub fn covered_ratio(&self) -> Option<f64> {
        match self.total() {
            0 => None,
            total => Some(f64::from(self.covered) / f64::from(total)),
        }
    }

    /// Ratio of missed items, `None` for an empty counter.
    pub fn missed_ratio(&self) -> Option<f64> {
        self.covered_ratio().map(|ratio| 1.0 - ratio)
    }

    pub fn status(&self) -> CounterStatus {
        match (self.missed, self.covered) {
            (0, 0) => CounterStatus::Empty,
            (_, 0) => CounterStatus::NotCovered,
            (0, _) => CounterStatus::FullyCovered,
            _ => CounterStatus::PartlyCovered,
        }
    }

    pub const fn is_empty(&self) -> bool {
        self.missed == 0 && self.covered == 0
    }
}

impl Add for Counter {
    type Output = Counter;

    fn add(self, rhs: Counter) -> Counter {
        self.combine(rhs)
    }
}

impl Sum for Counter {
    fn sum<I: Iterator<Item = Counter>>(iter: I) -> Counter {
        iter.fold(Counter::ZERO, Counter::combine)
    }
}

impl std::fmt::Display for Counter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.covered, self.total())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn combine_adds_componentwise() {
        let c = Counter::new(2, 3).combine(Counter::new(1, 4));
        assert_eq!(c, Counter::new(3, 7));
        assert_eq!(c.total(), 10);
    }

    #[test]
    fn adjust_moves_between_buckets() {
        let c = Counter::new(2, 1).adjust(-1, 1);
        assert_eq!(c, Counter::new(1, 2));
        assert_eq!(c.total(), 3);
    }

    #[test]
    fn from_total_clamps_covered() {
        assert_eq!(Counter::from_total(5, 2), Counter::new(3, 2));
        assert_eq!(Counter::from_total(1, 9), Counter::new(0, 1));
    }

    #[test]
    fn status_and_ratios() {
        assert_eq!(Counter::ZERO.status(), CounterStatus::Empty);
        assert_eq!(Counter::ZERO.covered_ratio(), None);
        assert_eq!(Counter::new(3, 0).status(), CounterStatus::NotCovered);
        assert_eq!(Counter::new(0, 3).status(), CounterStatus::FullyCovered);
        assert_eq!(Counter::new(1, 3).status(), CounterStatus::PartlyCovered);
        assert_eq!(Counter::new(1, 3).covered_ratio(), Some(0.75));
        assert_eq!(Counter::new(1, 3).missed_ratio(), Some(0.25));
    }

    #[test]
    fn status_merge() {
        use CounterStatus::*;
        assert_eq!(Empty.merge(NotCovered), NotCovered);
        assert_eq!(FullyCovered.merge(Empty), FullyCovered);
        assert_eq!(FullyCovered.merge(FullyCovered), FullyCovered);
        assert_eq!(FullyCovered.merge(NotCovered), PartlyCovered);
    }

    #[test]
    fn combine_saturates() {
        let big = Counter::new(u32::MAX - 1, u32::MAX);
        let c = big.combine(Counter::new(5, 1));
        assert_eq!((c.missed(), c.covered()), (u32::MAX, u32::MAX));
        assert_eq!(c.total(), u32::MAX);
    }

    #[test]
    fn sum_of_counters() {
        let total: Counter = [Counter::MISSED_ONE, Counter::COVERED_ONE, Counter::new(2, 2)]
            .into_iter()
            .sum();
        assert_eq!(total, Counter::new(3, 3));
    }

    proptest! {
        #[test]
        fn prop_combine_is_commutative(a in 0u32..10_000, b in 0u32..10_000, c in 0u32..10_000, d in 0u32..10_000) {
            let x = Counter::new(a, b);
            let y = Counter::new(c, d);
            prop_assert_eq!(x.combine(y), y.combine(x));
            prop_assert!(x.combine(y).covered() <= x.combine(y).total());
        }
    }
}
