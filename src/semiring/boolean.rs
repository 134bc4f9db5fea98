use super::{Scan, Semiring};
use crate::errors::Overflow;

/// Did anything match: `or` to combine paths, `and` to extend one.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Boolean {
    scan: Scan,
}

impl Boolean {
    /// The whole input must match.
    pub fn exact() -> Boolean {
        Boolean { scan: Scan::Exact }
    }

    /// Some substring of the input must match.
    pub fn search() -> Boolean {
        Boolean {
            scan: Scan::Anywhere,
        }
    }
}

impl Semiring for Boolean {
    type Weight = bool;

    fn zero(&self) -> bool {
        false
    }

    fn one(&self) -> bool {
        true
    }

    fn add(&self, a: &bool, b: &bool) -> Result<bool, Overflow> {
        Ok(*a || *b)
    }

    fn multiply(&self, a: &bool, b: &bool) -> Result<bool, Overflow> {
        Ok(*a && *b)
    }

    fn scan(&self) -> Scan {
        self.scan
    }

    fn saturated(&self, best: &bool) -> bool {
        *best
    }
}
