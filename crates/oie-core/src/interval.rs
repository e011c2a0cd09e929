//! Closed token intervals
//!
//! Token positions in a sentence are compared as closed, contiguous
//! ranges. The expansion engine relies on the exact semantics here:
//! `borders` means touching without overlap, `union` is the hull.

use serde::{Deserialize, Serialize};

/// A closed interval `[start, end]` of token indices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Interval {
    start: usize,
    end: usize,
}

impl Interval {
    /// Create an interval, swapping the bounds if given in reverse
    pub fn new(start: usize, end: usize) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self {
                start: end,
                end: start,
            }
        }
    }

    /// Interval covering a single index
    pub fn point(index: usize) -> Self {
        Self {
            start: index,
            end: index,
        }
    }

    /// Convex hull of a set of indices, `None` when empty
    pub fn span<I>(indices: I) -> Option<Self>
    where
        I: IntoIterator<Item = usize>,
    {
        indices.into_iter().fold(None, |acc, index| match acc {
            None => Some(Self::point(index)),
            Some(interval) => Some(interval.union(&Self::point(index))),
        })
    }

    /// Convex hull of a set of intervals, `None` when empty
    pub fn hull<I>(intervals: I) -> Option<Self>
    where
        I: IntoIterator<Item = Interval>,
    {
        intervals
            .into_iter()
            .reduce(|acc, interval| acc.union(&interval))
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    /// Number of indices covered
    pub fn len(&self) -> usize {
        self.end - self.start + 1
    }

    /// Closed intervals always cover at least one index
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Smallest interval covering both
    pub fn union(&self, other: &Interval) -> Interval {
        Interval {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// True if the intervals share at least one index
    pub fn intersects(&self, other: &Interval) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    /// True if the intervals touch without overlapping
    pub fn borders(&self, other: &Interval) -> bool {
        self.end.checked_add(1) == Some(other.start)
            || other.end.checked_add(1) == Some(self.start)
    }

    /// True if `other` lies entirely inside this interval
    pub fn superset(&self, other: &Interval) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    pub fn contains(&self, index: usize) -> bool {
        self.start <= index && index <= self.end
    }
}

impl std::fmt::Display for Interval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.start, self.end)
    }
}
