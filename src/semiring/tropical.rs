use std::fmt;

use super::Semiring;
use crate::errors::Overflow;

/// Cheapest derivation, with a caller-supplied cost per consumed symbol.
///
/// The weight is `None` for "no derivation" (infinite cost); `add` takes the
/// minimum and `multiply` sums costs.
pub struct Tropical<F = fn(usize, char) -> u64> {
    cost: F,
}

impl Tropical {
    /// Every symbol costs one, so the weight of a match is its length.
    pub fn uniform() -> Tropical {
        Tropical { cost: |_, _| 1 }
    }
}

impl<F: Fn(usize, char) -> u64> Tropical<F> {
    /// `cost(offset, symbol)` is charged each time `symbol` is consumed at
    /// input offset `offset`.
    pub fn new(cost: F) -> Tropical<F> {
        Tropical { cost }
    }
}

impl<F> fmt::Debug for Tropical<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tropical").finish_non_exhaustive()
    }
}

impl<F: Fn(usize, char) -> u64> Semiring for Tropical<F> {
    type Weight = Option<u64>;

    fn zero(&self) -> Option<u64> {
        None
    }

    fn one(&self) -> Option<u64> {
        Some(0)
    }

    fn add(&self, a: &Option<u64>, b: &Option<u64>) -> Result<Option<u64>, Overflow> {
        Ok(match (*a, *b) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, None) => a,
            (None, b) => b,
        })
    }

    fn multiply(&self, a: &Option<u64>, b: &Option<u64>) -> Result<Option<u64>, Overflow> {
        match (*a, *b) {
            (Some(a), Some(b)) => a.checked_add(b).map(Some).ok_or(Overflow),
            _ => Ok(None),
        }
    }

    fn symbol(&self, at: usize, symbol: char) -> Option<u64> {
        Some((self.cost)(at, symbol))
    }

    fn prefer(&self, kept: &Option<u64>, incoming: &Option<u64>) -> bool {
        match (*kept, *incoming) {
            (Some(kept), Some(incoming)) => incoming < kept,
            (None, Some(_)) => true,
            _ => false,
        }
    }
}
