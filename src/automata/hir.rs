//! The tree the compiler emits code from.
//!
//! Lowering removes everything the instruction set has no direct form for:
//! counted repetitions become copies and a run of optional copies, and `e*`/`e+`
//! become loops whose body can only match non-empty input. A loop body that
//! could match the empty string would give the automaton a cycle of
//! non-consuming edges, and with it an unbounded number of derivations for a
//! single input. Splitting every sub-expression into its empty and non-empty
//! derivations keeps each derivation of the pattern exactly once.

use crate::ast::{self, Ast};
use crate::automata::program::{Look, SymbolClass};
use crate::errors::CompileError;

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Hir {
    Empty,
    Class(SymbolClass),
    Look(Look),
    Concat(Vec<Hir>),
    Alternate(Vec<Hir>),
    Capture { index: usize, hir: Box<Hir> },
    Optional { hir: Box<Hir>, greedy: bool },
    /// `(?:e(?:e(?:e)?)?)?` with `count` levels, kept flat so that long
    /// bounded repetitions don't nest.
    UpTo { hir: Box<Hir>, count: u32, greedy: bool },
    /// Zero or more iterations. The body is never nullable.
    Star { hir: Box<Hir>, greedy: bool },
}

impl Hir {
    fn concat(mut hirs: Vec<Hir>) -> Hir {
        hirs.retain(|h| *h != Hir::Empty);
        match hirs.len() {
            0 => Hir::Empty,
            1 => hirs.pop().unwrap_or(Hir::Empty),
            _ => Hir::Concat(hirs),
        }
    }

    /// At most `count` copies of `hir`, each optional after the last.
    fn up_to(hir: Hir, count: u32, greedy: bool) -> Hir {
        match count {
            0 => Hir::Empty,
            1 => Hir::Optional {
                hir: Box::new(hir),
                greedy,
            },
            _ => Hir::UpTo {
                hir: Box::new(hir),
                count,
                greedy,
            },
        }
    }

    fn alternate(mut hirs: Vec<Hir>) -> Option<Hir> {
        match hirs.len() {
            0 => None,
            1 => hirs.pop(),
            _ => Some(Hir::Alternate(hirs)),
        }
    }

    /// Whether some derivation consumes no input.
    pub fn is_nullable(&self) -> bool {
        match *self {
            Hir::Empty
            | Hir::Look(_)
            | Hir::Optional { .. }
            | Hir::UpTo { .. }
            | Hir::Star { .. } => true,
            Hir::Class(_) => false,
            Hir::Concat(ref hirs) => hirs.iter().all(Hir::is_nullable),
            Hir::Alternate(ref hirs) => hirs.iter().any(Hir::is_nullable),
            Hir::Capture { ref hir, .. } => hir.is_nullable(),
        }
    }

    /// Number of instructions this node compiles to.
    pub fn size(&self) -> usize {
        match *self {
            Hir::Empty | Hir::Class(_) | Hir::Look(_) => 1,
            Hir::Concat(ref hirs) => hirs.iter().map(Hir::size).sum(),
            Hir::Alternate(ref hirs) => {
                hirs.len().saturating_sub(1) + hirs.iter().map(Hir::size).sum::<usize>()
            }
            Hir::Capture { ref hir, .. } => 2 + hir.size(),
            Hir::Optional { ref hir, .. } | Hir::Star { ref hir, .. } => 1 + hir.size(),
            Hir::UpTo { ref hir, count, .. } => (count as usize).saturating_mul(1 + hir.size()),
        }
    }
}

pub struct Lowering {
    limit: usize,
}

type Result<T> = std::result::Result<T, CompileError>;

impl Lowering {
    pub fn new(limit: usize) -> Lowering {
        Lowering { limit }
    }

    fn check(&self, size: usize) -> Result<()> {
        if size > self.limit {
            return Err(CompileError::ProgramTooLarge { limit: self.limit });
        }
        Ok(())
    }

    pub fn lower(&self, ast: &Ast) -> Result<Hir> {
        let hir = match *ast {
            Ast::Empty(_) => Hir::Empty,
            Ast::Literal(ref lit) => Hir::Class(SymbolClass::single(lit.char)),
            Ast::Dot(_) => Hir::Class(SymbolClass::any()),
            Ast::Class(ref class) => Hir::Class(class_to_symbols(class)),
            Ast::Assertion(ref assertion) => Hir::Look(match assertion.kind {
                ast::AssertionKind::StartText => Look::Start,
                ast::AssertionKind::EndText => Look::End,
            }),
            Ast::Concat(ref concat) => Hir::concat(
                concat
                    .asts()
                    .iter()
                    .map(|a| self.lower(a))
                    .collect::<Result<_>>()?,
            ),
            Ast::Alternation(ref alt) => Hir::Alternate(
                alt.asts
                    .iter()
                    .map(|a| self.lower(a))
                    .collect::<Result<_>>()?,
            ),
            Ast::Group(ref group) => {
                let hir = self.lower(&group.ast)?;
                match group.capture_index() {
                    Some(index) => Hir::Capture {
                        index,
                        hir: Box::new(hir),
                    },
                    None => hir,
                }
            }
            Ast::Repetition(ref rep) => {
                let (min, max) = rep.bounds();
                self.repeat(self.lower(&rep.ast)?, min, max, rep.greedy)?
            }
        };
        self.check(hir.size())?;
        Ok(hir)
    }

    /// `e{min,max}`: `min` copies, then either a loop of non-empty iterations
    /// or up to `max - min` more copies.
    fn repeat(&self, hir: Hir, min: u32, max: Option<u32>, greedy: bool) -> Result<Hir> {
        let copies = max.unwrap_or(min).max(min) as usize;
        self.check(hir.size().saturating_mul(copies.max(1)))?;

        let mut seq: Vec<Hir> = (0..min).map(|_| hir.clone()).collect();
        match max {
            None => {
                let tail = match self.non_empty(&hir)? {
                    Some(body) => Hir::Star {
                        hir: Box::new(body),
                        greedy,
                    },
                    None => Hir::Empty,
                };
                seq.push(tail);
            }
            Some(max) => seq.push(Hir::up_to(hir, max - min, greedy)),
        }
        Ok(Hir::concat(seq))
    }

    /// The derivations of `hir` that consume at least one symbol, or `None`
    /// if there are none.
    pub fn non_empty(&self, hir: &Hir) -> Result<Option<Hir>> {
        if !hir.is_nullable() {
            return Ok(Some(hir.clone()));
        }
        let result = match *hir {
            Hir::Empty | Hir::Look(_) => None,
            Hir::Class(_) => Some(hir.clone()),
            Hir::Capture { index, ref hir } => self.non_empty(hir)?.map(|h| Hir::Capture {
                index,
                hir: Box::new(h),
            }),
            Hir::Alternate(ref hirs) => {
                let mut branches = vec![];
                for h in hirs {
                    branches.extend(self.non_empty(h)?);
                }
                Hir::alternate(branches)
            }
            // (e | ε) loses the ε branch.
            Hir::Optional { ref hir, .. } => self.non_empty(hir)?,
            // Some copy consumes first; the copies before it matched empty and
            // fewer may follow.
            Hir::UpTo {
                hir: ref body,
                count,
                greedy,
            } => {
                let first = self.non_empty(body)?;
                let empty = self.only_empty(body)?;
                let mut branches = vec![];
                let mut prefix = vec![];
                for j in 0..count {
                    if let Some(ref first) = first {
                        let mut seq = prefix.clone();
                        seq.push(first.clone());
                        seq.push(Hir::up_to((**body).clone(), count - 1 - j, greedy));
                        let branch = Hir::concat(seq);
                        self.check(branch.size())?;
                        branches.push(branch);
                    }
                    match empty {
                        Some(ref e) => prefix.push(e.clone()),
                        None => break,
                    }
                }
                Hir::alternate(branches)
            }
            // The first iteration consumes, the rest are unchanged.
            Hir::Star { hir: ref body, .. } => Some(Hir::concat(vec![(**body).clone(), hir.clone()])),
            // Split on the first item that consumes: everything before it
            // matched empty, everything after it is unrestricted.
            Hir::Concat(ref hirs) => {
                let mut branches = vec![];
                let mut prefix = vec![];
                for (i, h) in hirs.iter().enumerate() {
                    if let Some(first) = self.non_empty(h)? {
                        let mut seq = prefix.clone();
                        seq.push(first);
                        seq.extend(hirs[i + 1..].iter().cloned());
                        branches.push(Hir::concat(seq));
                    }
                    match self.only_empty(h)? {
                        Some(e) => prefix.push(e),
                        None => break,
                    }
                }
                Hir::alternate(branches)
            }
        };
        if let Some(ref h) = result {
            self.check(h.size())?;
        }
        Ok(result)
    }

    /// The derivations of `hir` that consume nothing, or `None` if there are
    /// none.
    pub fn only_empty(&self, hir: &Hir) -> Result<Option<Hir>> {
        if !hir.is_nullable() {
            return Ok(None);
        }
        let result = match *hir {
            Hir::Empty | Hir::Look(_) => Some(hir.clone()),
            Hir::Class(_) => None,
            // Loop iterations always consume, so only zero iterations remain.
            Hir::Star { .. } => Some(Hir::Empty),
            Hir::Capture { index, ref hir } => self.only_empty(hir)?.map(|h| Hir::Capture {
                index,
                hir: Box::new(h),
            }),
            Hir::Optional { ref hir, greedy } => Some(match self.only_empty(hir)? {
                Some(h) => Hir::Optional {
                    hir: Box::new(h),
                    greedy,
                },
                None => Hir::Empty,
            }),
            Hir::UpTo {
                ref hir,
                count,
                greedy,
            } => Some(match self.only_empty(hir)? {
                Some(h) => Hir::up_to(h, count, greedy),
                None => Hir::Empty,
            }),
            Hir::Alternate(ref hirs) => {
                let mut branches = vec![];
                for h in hirs {
                    branches.extend(self.only_empty(h)?);
                }
                Hir::alternate(branches)
            }
            Hir::Concat(ref hirs) => {
                let mut seq = vec![];
                for h in hirs {
                    match self.only_empty(h)? {
                        Some(e) => seq.push(e),
                        None => return Ok(None),
                    }
                }
                Some(Hir::concat(seq))
            }
        };
        Ok(result)
    }
}

/// Resolves a bracket or Perl class into the set of symbols it matches.
pub fn class_to_symbols(class: &ast::Class) -> SymbolClass {
    let mut set = SymbolClass::default();
    for item in &class.items {
        let item_set = match *item {
            ast::ClassItem::Literal(c) => SymbolClass::single(c),
            ast::ClassItem::Range(a, b) => SymbolClass::new([(a, b)]),
            ast::ClassItem::Perl(perl) => {
                let s = SymbolClass::new(perl.kind.ranges().iter().copied());
                if perl.negated {
                    s.negate()
                } else {
                    s
                }
            }
        };
        set = set.union(&item_set);
    }
    if class.negated {
        set.negate()
    } else {
        set
    }
}
