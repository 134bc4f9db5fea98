//! Exhaustive derivation counting straight off the syntax tree, used to
//! check the executor on generated patterns.

use std::collections::BTreeMap;

use crate::ast::{self, Ast};
use crate::automata::hir::class_to_symbols;

/// Derivation counts keyed by the offset each derivation ends at.
type Ends = BTreeMap<usize, u128>;

fn add(ends: &mut Ends, at: usize, n: u128) {
    if n > 0 {
        let e = ends.entry(at).or_insert(0);
        *e = e.saturating_add(n);
    }
}

/// Derivations of `ast` over `input[from..]`, for every end offset.
fn ends(ast: &Ast, input: &[char], from: usize) -> Ends {
    let mut out = Ends::new();
    match *ast {
        Ast::Empty(_) => add(&mut out, from, 1),
        Ast::Literal(ref lit) => {
            if input.get(from) == Some(&lit.char) {
                add(&mut out, from + 1, 1);
            }
        }
        Ast::Dot(_) => {
            if from < input.len() {
                add(&mut out, from + 1, 1);
            }
        }
        Ast::Class(ref class) => {
            if input.get(from).is_some_and(|&c| class_to_symbols(class).contains(c)) {
                add(&mut out, from + 1, 1);
            }
        }
        Ast::Assertion(ref assertion) => {
            let holds = match assertion.kind {
                ast::AssertionKind::StartText => from == 0,
                ast::AssertionKind::EndText => from == input.len(),
            };
            if holds {
                add(&mut out, from, 1);
            }
        }
        Ast::Group(ref group) => return ends(&group.ast, input, from),
        Ast::Alternation(ref alt) => {
            for a in &alt.asts {
                for (at, n) in ends(a, input, from) {
                    add(&mut out, at, n);
                }
            }
        }
        Ast::Concat(ref concat) => {
            add(&mut out, from, 1);
            for a in concat.asts() {
                out = then(&out, |p| ends(a, input, p));
            }
        }
        Ast::Repetition(ref rep) => {
            let (min, max) = rep.bounds();
            let once = |p| ends(&rep.ast, input, p);
            add(&mut out, from, 1);
            for _ in 0..min {
                out = then(&out, once);
            }
            match max {
                // ε | e(ε | e(...)), `max - min` levels deep.
                Some(max) => {
                    let mut total = out.clone();
                    let mut layer = out;
                    for _ in min..max {
                        layer = then(&layer, once);
                        for (&at, &n) in &layer {
                            add(&mut total, at, n);
                        }
                    }
                    out = total;
                }
                // Any number of further iterations, each consuming input.
                None => {
                    let len = input.len();
                    for p in from..=len {
                        let Some(&n) = out.get(&p) else { continue };
                        for (at, k) in once(p) {
                            if at > p {
                                add(&mut out, at, n.saturating_mul(k));
                            }
                        }
                    }
                }
            }
        }
    }
    out
}

fn then(prefix: &Ends, next: impl Fn(usize) -> Ends) -> Ends {
    let mut out = Ends::new();
    for (&p, &n) in prefix {
        for (at, k) in next(p) {
            add(&mut out, at, n.saturating_mul(k));
        }
    }
    out
}

/// Number of derivations of the whole input.
pub fn count(ast: &Ast, input: &[char]) -> u128 {
    ends(ast, input, 0)
        .get(&input.len())
        .copied()
        .unwrap_or(0)
}

/// The earliest-starting match, and of those the longest.
pub fn leftmost_longest(ast: &Ast, input: &[char]) -> Option<(usize, usize)> {
    (0..=input.len()).find_map(|start| {
        ends(ast, input, start)
            .keys()
            .next_back()
            .map(|&end| (start, end))
    })
}
