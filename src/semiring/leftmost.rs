use std::cmp::Ordering;

use super::{Scan, Semiring};
use crate::errors::Overflow;

/// Weight of [`LeftmostLongest`]: the extent of the best derivation so far.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Extent {
    /// No derivation.
    Never,
    /// The neutral extent; absorbed by any span it is combined with.
    Unit,
    Span { start: usize, end: usize },
}

impl Extent {
    /// Orders extents by preference: any span beats `Unit`, which beats
    /// `Never`; among spans the earlier start wins, then the later end.
    fn rank(&self, other: &Extent) -> Ordering {
        match (*self, *other) {
            (Extent::Span { start: s1, end: e1 }, Extent::Span { start: s2, end: e2 }) => {
                s2.cmp(&s1).then(e1.cmp(&e2))
            }
            (a, b) => a.level().cmp(&b.level()),
        }
    }

    fn level(&self) -> u8 {
        match *self {
            Extent::Never => 0,
            Extent::Unit => 1,
            Extent::Span { .. } => 2,
        }
    }
}

/// Finds the leftmost match, and among those the longest.
///
/// Every fresh thread carries the empty span at its start offset and each
/// consumed symbol extends it, so the weight reaching an accept is exactly
/// the span of input the derivation covers. `add` keeps the better span.
/// Multiplication distributes over `add` only for spans that share a start,
/// which is the only case the executor combines.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct LeftmostLongest;

impl Semiring for LeftmostLongest {
    type Weight = Extent;

    fn zero(&self) -> Extent {
        Extent::Never
    }

    fn one(&self) -> Extent {
        Extent::Unit
    }

    fn add(&self, a: &Extent, b: &Extent) -> Result<Extent, Overflow> {
        Ok(match a.rank(b) {
            Ordering::Less => *b,
            _ => *a,
        })
    }

    fn multiply(&self, a: &Extent, b: &Extent) -> Result<Extent, Overflow> {
        Ok(match (*a, *b) {
            (Extent::Never, _) | (_, Extent::Never) => Extent::Never,
            (Extent::Unit, x) | (x, Extent::Unit) => x,
            (Extent::Span { start, .. }, Extent::Span { end, .. }) => Extent::Span { start, end },
        })
    }

    fn scan(&self) -> Scan {
        Scan::Anywhere
    }

    fn start(&self, at: usize) -> Extent {
        Extent::Span { start: at, end: at }
    }

    fn symbol(&self, at: usize, _symbol: char) -> Extent {
        Extent::Span {
            start: at,
            end: at + 1,
        }
    }

    fn prefer(&self, kept: &Extent, incoming: &Extent) -> bool {
        incoming.rank(kept) == Ordering::Greater
    }

    fn restart_after_accept(&self) -> bool {
        false
    }
}
