use super::{Scan, Semiring};
use crate::errors::Overflow;

/// Number of distinct derivations. Overflow is an error, never a wrap.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Counting {
    scan: Scan,
}

impl Counting {
    pub fn exact() -> Counting {
        Counting { scan: Scan::Exact }
    }

    /// Counts derivations of every substring, summed over all spans.
    pub fn search() -> Counting {
        Counting {
            scan: Scan::Anywhere,
        }
    }
}

impl Semiring for Counting {
    type Weight = u64;

    fn zero(&self) -> u64 {
        0
    }

    fn one(&self) -> u64 {
        1
    }

    fn add(&self, a: &u64, b: &u64) -> Result<u64, Overflow> {
        a.checked_add(*b).ok_or(Overflow)
    }

    fn multiply(&self, a: &u64, b: &u64) -> Result<u64, Overflow> {
        a.checked_mul(*b).ok_or(Overflow)
    }

    fn scan(&self) -> Scan {
        self.scan
    }
}
