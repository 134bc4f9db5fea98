use std::fmt;

use crate::config::Alphabet;

pub type InstPtr = usize;

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Inst {
    Accept,
    Symbol(InstSymbol),
    Split(InstSplit),
    Jump(InstJump),
    Save(InstSave),
    Assert(InstAssert),
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct InstSave {
    pub slot: usize,
    pub goto: InstPtr,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct InstSymbol {
    pub class: SymbolClass,
    pub goto: InstPtr,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct InstSplit {
    pub goto1: InstPtr,
    pub goto2: InstPtr,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct InstJump {
    pub goto: InstPtr,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct InstAssert {
    pub look: Look,
    pub goto: InstPtr,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Look {
    Start,
    End,
}

impl Look {
    pub fn holds(self, at: usize, at_end: bool) -> bool {
        match self {
            Look::Start => at == 0,
            Look::End => at_end,
        }
    }
}

#[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd)]
pub struct ClassRange {
    pub start: char,
    pub end: char,
}

impl fmt::Debug for ClassRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{:?}", self.start)
        } else {
            write!(f, "{:?}-{:?}", self.start, self.end)
        }
    }
}

/// A set of symbols, kept as sorted, non-overlapping, non-adjacent ranges.
#[derive(Clone, Eq, PartialEq, Default)]
pub struct SymbolClass {
    ranges: Vec<ClassRange>,
}

impl SymbolClass {
    pub fn single(c: char) -> SymbolClass {
        SymbolClass {
            ranges: vec![ClassRange { start: c, end: c }],
        }
    }

    pub fn any() -> SymbolClass {
        SymbolClass {
            ranges: vec![ClassRange {
                start: '\0',
                end: char::MAX,
            }],
        }
    }

    pub fn new<I: IntoIterator<Item = (char, char)>>(ranges: I) -> SymbolClass {
        let mut ranges: Vec<ClassRange> = ranges
            .into_iter()
            .map(|(a, b)| ClassRange {
                start: a.min(b),
                end: a.max(b),
            })
            .collect();
        ranges.sort();
        let mut merged: Vec<ClassRange> = Vec::with_capacity(ranges.len());
        for r in ranges {
            match merged.last_mut() {
                Some(last) if next_char(last.end).map_or(true, |n| r.start <= n) => {
                    last.end = last.end.max(r.end);
                }
                _ => merged.push(r),
            }
        }
        SymbolClass { ranges: merged }
    }

    pub fn ranges(&self) -> &[ClassRange] {
        &self.ranges
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn union(&self, other: &SymbolClass) -> SymbolClass {
        SymbolClass::new(
            self.ranges
                .iter()
                .chain(other.ranges.iter())
                .map(|r| (r.start, r.end)),
        )
    }

    /// Every Unicode scalar value not in this class.
    pub fn negate(&self) -> SymbolClass {
        let mut ranges = vec![];
        let mut next = Some('\0');
        for r in &self.ranges {
            if let Some(lo) = next {
                if lo < r.start {
                    if let Some(hi) = prev_char(r.start) {
                        ranges.push(ClassRange { start: lo, end: hi });
                    }
                }
            }
            next = next_char(r.end);
        }
        if let Some(lo) = next {
            ranges.push(ClassRange {
                start: lo,
                end: char::MAX,
            });
        }
        SymbolClass { ranges }
    }

    pub fn contains(&self, c: char) -> bool {
        self.ranges
            .binary_search_by(|r| {
                if r.end < c {
                    std::cmp::Ordering::Less
                } else if r.start > c {
                    std::cmp::Ordering::Greater
                } else {
                    std::cmp::Ordering::Equal
                }
            })
            .is_ok()
    }
}

impl fmt::Debug for SymbolClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.ranges.iter()).finish()
    }
}

fn next_char(c: char) -> Option<char> {
    match c {
        '\u{D7FF}' => Some('\u{E000}'),
        char::MAX => None,
        c => char::from_u32(c as u32 + 1),
    }
}

fn prev_char(c: char) -> Option<char> {
    match c {
        '\0' => None,
        '\u{E000}' => Some('\u{D7FF}'),
        c => char::from_u32(c as u32 - 1),
    }
}

/// An immutable compiled pattern, shareable across any number of matches.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Program {
    pub insts: Vec<Inst>,
    pub start: InstPtr,
    /// Topological rank of every instruction over the non-consuming edges.
    pub ranks: Vec<u32>,
    /// One entry per capture group, group 0 being the whole match.
    pub group_names: Vec<Option<String>>,
    pub alphabet: Alphabet,
}

impl Program {
    pub fn len(&self) -> usize {
        self.insts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.insts.is_empty()
    }

    /// Number of capture slots, two per group.
    pub fn slots(&self) -> usize {
        2 * self.group_names.len()
    }

    pub fn group_index(&self, name: &str) -> Option<usize> {
        self.group_names
            .iter()
            .position(|n| n.as_deref() == Some(name))
    }
}

#[cfg(test)]
mod tests {
    use super::{ClassRange, SymbolClass};
    use pretty_assertions::assert_eq;

    fn r(start: char, end: char) -> ClassRange {
        ClassRange { start, end }
    }

    #[test]
    fn class_normalizes_ranges() {
        let class = SymbolClass::new([('x', 'z'), ('a', 'c'), ('b', 'f'), ('g', 'g')]);
        assert_eq!(class.ranges(), &[r('a', 'g'), r('x', 'z')]);
        assert!(class.contains('e'));
        assert!(class.contains('y'));
        assert!(!class.contains('h'));
    }

    #[test]
    fn negate_skips_surrogates() {
        let class = SymbolClass::new([('a', 'a')]).negate();
        assert_eq!(class.ranges(), &[r('\0', '`'), r('b', char::MAX)]);

        let class = SymbolClass::new([('\0', '\u{D7FF}')]).negate();
        assert_eq!(class.ranges(), &[r('\u{E000}', char::MAX)]);
        assert!(SymbolClass::any().negate().is_empty());
        assert_eq!(SymbolClass::default().negate(), SymbolClass::any());
    }
}
