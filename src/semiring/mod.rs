//! Weight algebras the executor is generic over.
//!
//! A [`Semiring`] supplies `zero`, `one`, `add` and `multiply` over its
//! weight type. The executor multiplies weights along a path and adds the
//! weights of paths that meet at the same instruction, so the question a
//! match answers is picked by choosing the semiring, not by changing the
//! matcher. Implementations are expected to satisfy the semiring laws;
//! nothing checks them at run time.

use std::fmt;

use crate::errors::Overflow;

mod boolean;
mod counting;
mod leftmost;
mod tropical;

pub use boolean::Boolean;
pub use counting::Counting;
pub use leftmost::{Extent, LeftmostLongest};
pub use tropical::Tropical;

/// Where a derivation may start and end in the input.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Default)]
pub enum Scan {
    /// The whole input has to be derived: one start at offset 0, and only
    /// accepts at end-of-input count.
    #[default]
    Exact,
    /// A derivation may start at any offset and end at any later one.
    Anywhere,
}

pub trait Semiring {
    type Weight: Clone + PartialEq + fmt::Debug;

    fn zero(&self) -> Self::Weight;

    fn one(&self) -> Self::Weight;

    fn add(&self, a: &Self::Weight, b: &Self::Weight) -> Result<Self::Weight, Overflow>;

    fn multiply(&self, a: &Self::Weight, b: &Self::Weight) -> Result<Self::Weight, Overflow>;

    fn is_zero(&self, w: &Self::Weight) -> bool {
        *w == self.zero()
    }

    fn scan(&self) -> Scan {
        Scan::Exact
    }

    /// Weight a fresh thread starts with at input offset `at`.
    fn start(&self, _at: usize) -> Self::Weight {
        self.one()
    }

    /// Weight of consuming `symbol` at input offset `at`.
    fn symbol(&self, _at: usize, _symbol: char) -> Self::Weight {
        self.one()
    }

    /// Capture-merge rule: when two paths meet, whether the captures of
    /// `incoming` replace those of `kept`. The default keeps whichever path
    /// arrived first.
    fn prefer(&self, _kept: &Self::Weight, _incoming: &Self::Weight) -> bool {
        false
    }

    /// True once no further accept can change `best`.
    fn saturated(&self, _best: &Self::Weight) -> bool {
        false
    }

    /// Whether new threads are started after some accept was recorded.
    fn restart_after_accept(&self) -> bool {
        true
    }
}

impl<S: Semiring + ?Sized> Semiring for &S {
    type Weight = S::Weight;

    fn zero(&self) -> Self::Weight {
        (**self).zero()
    }

    fn one(&self) -> Self::Weight {
        (**self).one()
    }

    fn add(&self, a: &Self::Weight, b: &Self::Weight) -> Result<Self::Weight, Overflow> {
        (**self).add(a, b)
    }

    fn multiply(&self, a: &Self::Weight, b: &Self::Weight) -> Result<Self::Weight, Overflow> {
        (**self).multiply(a, b)
    }

    fn is_zero(&self, w: &Self::Weight) -> bool {
        (**self).is_zero(w)
    }

    fn scan(&self) -> Scan {
        (**self).scan()
    }

    fn start(&self, at: usize) -> Self::Weight {
        (**self).start(at)
    }

    fn symbol(&self, at: usize, symbol: char) -> Self::Weight {
        (**self).symbol(at, symbol)
    }

    fn prefer(&self, kept: &Self::Weight, incoming: &Self::Weight) -> bool {
        (**self).prefer(kept, incoming)
    }

    fn saturated(&self, best: &Self::Weight) -> bool {
        (**self).saturated(best)
    }

    fn restart_after_accept(&self) -> bool {
        (**self).restart_after_accept()
    }
}

#[cfg(test)]
pub(crate) mod laws {
    use super::Semiring;
    use pretty_assertions::assert_eq;

    /// Checks the semiring laws over every combination of `samples`.
    pub fn check<S: Semiring>(s: &S, samples: &[S::Weight]) {
        let add = |a: &S::Weight, b: &S::Weight| s.add(a, b).expect("no overflow");
        let mul = |a: &S::Weight, b: &S::Weight| s.multiply(a, b).expect("no overflow");
        for a in samples {
            assert_eq!(add(a, &s.zero()), *a, "zero is the additive identity");
            assert_eq!(mul(a, &s.one()), *a, "one is the right identity");
            assert_eq!(mul(&s.one(), a), *a, "one is the left identity");
            assert_eq!(mul(a, &s.zero()), s.zero(), "zero annihilates");
            for b in samples {
                assert_eq!(add(a, b), add(b, a), "add commutes");
                for c in samples {
                    assert_eq!(add(&add(a, b), c), add(a, &add(b, c)), "add associates");
                    assert_eq!(mul(&mul(a, b), c), mul(a, &mul(b, c)), "multiply associates");
                    assert_eq!(
                        mul(a, &add(b, c)),
                        add(&mul(a, b), &mul(a, c)),
                        "multiply distributes"
                    );
                }
            }
        }
    }
}
