//! Turning an executor [`Outcome`] into the answer a caller asked for.

use std::ops::Range;
use std::sync::Arc;

use crate::automata::program::Program;
use crate::semiring::Extent;

/// What a run produced: the total weight of all accepted derivations, and
/// the capture slots of the one the semiring's merge rule kept.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Outcome<W> {
    pub weight: W,
    /// Two slots per group; all `None` when nothing was accepted.
    pub slots: Vec<Option<usize>>,
}

/// A matching span of the input, in symbol offsets.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Match {
    start: usize,
    end: usize,
}

impl Match {
    pub fn new(start: usize, end: usize) -> Match {
        Match { start, end }
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}

/// Capture group spans of one match. Group 0 is the whole match.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Captures {
    slots: Vec<Option<usize>>,
    names: Arc<[Option<String>]>,
}

impl Captures {
    pub(crate) fn new(slots: Vec<Option<usize>>, names: Arc<[Option<String>]>) -> Captures {
        Captures { slots, names }
    }

    /// The span of group `i`, if that group took part in the match.
    pub fn get(&self, i: usize) -> Option<Match> {
        match (self.slots.get(2 * i), self.slots.get(2 * i + 1)) {
            (Some(&Some(start)), Some(&Some(end))) => Some(Match::new(start, end)),
            _ => None,
        }
    }

    pub fn name(&self, name: &str) -> Option<Match> {
        let i = self
            .names
            .iter()
            .position(|n| n.as_deref() == Some(name))?;
        self.get(i)
    }

    /// Number of groups, including group 0.
    pub fn len(&self) -> usize {
        self.slots.len() / 2
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Option<Match>> + '_ {
        (0..self.len()).map(move |i| self.get(i))
    }
}

/// Reads a typed answer out of a run's outcome.
pub trait FromOutcome<W>: Sized {
    /// Whether building `Self` needs the outcome's capture slots.
    const CAPTURES: bool = false;

    fn from_outcome(outcome: Outcome<W>, program: &Program) -> Self;
}

impl FromOutcome<bool> for bool {
    fn from_outcome(outcome: Outcome<bool>, _: &Program) -> bool {
        outcome.weight
    }
}

impl FromOutcome<u64> for u64 {
    fn from_outcome(outcome: Outcome<u64>, _: &Program) -> u64 {
        outcome.weight
    }
}

impl<W> FromOutcome<W> for Outcome<W> {
    const CAPTURES: bool = true;

    fn from_outcome(outcome: Outcome<W>, _: &Program) -> Outcome<W> {
        outcome
    }
}

impl FromOutcome<Extent> for Option<Match> {
    fn from_outcome(outcome: Outcome<Extent>, _: &Program) -> Option<Match> {
        match outcome.weight {
            Extent::Span { start, end } => Some(Match::new(start, end)),
            Extent::Never | Extent::Unit => None,
        }
    }
}

impl FromOutcome<Extent> for Option<Captures> {
    const CAPTURES: bool = true;

    fn from_outcome(outcome: Outcome<Extent>, program: &Program) -> Option<Captures> {
        match outcome.weight {
            Extent::Span { .. } => Some(Captures::new(
                outcome.slots,
                program.group_names.clone().into(),
            )),
            Extent::Never | Extent::Unit => None,
        }
    }
}
