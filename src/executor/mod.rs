//! A Pike VM that carries a semiring weight on every thread.
//!
//! All threads advance over the input in lock step. At each offset the
//! epsilon closure runs in the program's rank order, so every instruction is
//! visited once, after every non-consuming path into it has been summed.
//! Threads that meet at the same instruction are combined with `add`;
//! consuming a symbol multiplies in that symbol's weight.
//!
//! Captures, when asked for, follow thread priority instead: a second, depth
//! first walk of the closure visits goto1 before goto2, and the first path to
//! reach an instruction decides its capture row.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use log::{debug, trace};

use crate::automata::compiler::epsilon_successors;
use crate::automata::program::{
    Inst, InstAssert, InstJump, InstPtr, InstSave, InstSplit, InstSymbol, Program,
};
use crate::errors::{MatchError, Overflow};
use crate::extract::Outcome;
use crate::semiring::{Scan, Semiring};

mod threads;
#[cfg(test)]
mod oracle;

use threads::Threads;

pub struct Executor<'p, S: Semiring> {
    program: &'p Program,
    semiring: S,
    captures: bool,
    clist: Threads<S::Weight>,
    nlist: Threads<S::Weight>,
    /// Closure worklist keyed by instruction rank.
    heap: BinaryHeap<Reverse<(u32, InstPtr)>>,
    /// Threads entering the closure, best first.
    sources: Vec<InstPtr>,
    /// Closure addresses in priority order. Only kept with captures.
    order: Vec<InstPtr>,
    visited: Vec<bool>,
    stack: Vec<Frame>,
    scratch: Vec<Option<usize>>,
    best: S::Weight,
    best_slots: Vec<Option<usize>>,
}

enum Frame {
    Explore(InstPtr),
    Restore { slot: usize, old: Option<usize> },
}

impl<'p, S: Semiring> Executor<'p, S> {
    /// An executor that computes weights only. The outcome's `slots` are
    /// empty.
    pub fn new(program: &'p Program, semiring: S) -> Executor<'p, S> {
        Executor::build(program, semiring, false)
    }

    /// An executor that also records the capture slots of the preferred
    /// accepted derivation.
    pub fn with_captures(program: &'p Program, semiring: S) -> Executor<'p, S> {
        Executor::build(program, semiring, true)
    }

    fn build(program: &'p Program, semiring: S, captures: bool) -> Executor<'p, S> {
        let nslots = if captures { program.slots() } else { 0 };
        Executor {
            program,
            captures,
            clist: Threads::new(program.len(), nslots),
            nlist: Threads::new(program.len(), nslots),
            heap: BinaryHeap::with_capacity(program.len()),
            sources: Vec::with_capacity(program.len()),
            order: Vec::new(),
            visited: if captures { vec![false; program.len()] } else { Vec::new() },
            stack: Vec::new(),
            scratch: vec![None; nslots],
            best: semiring.zero(),
            best_slots: vec![None; nslots],
            semiring,
        }
    }

    /// Runs the program over `input` and sums the weights of every accepted
    /// derivation. The input is always read to its end so that every symbol
    /// is checked against the program's alphabet.
    pub fn run<I>(&mut self, input: I) -> Result<Outcome<S::Weight>, MatchError>
    where
        I: IntoIterator<Item = char>,
    {
        self.reset();
        let scan = self.semiring.scan();
        let mut input = input.into_iter();
        let mut at = 0;
        loop {
            let next = input.next();
            if let Some(c) = next {
                self.check(at, c)?;
            }
            let at_end = next.is_none();
            if self.may_seed(scan, at) {
                self.seed(at).map_err(overflow(at))?;
            }
            self.closure(at, at_end).map_err(overflow(at))?;
            if scan == Scan::Anywhere || at_end {
                self.accept().map_err(overflow(at))?;
            }
            trace!("offset {}: {} live threads", at, self.clist.len());

            let Some(c) = next else { break };
            if self.semiring.saturated(&self.best) {
                at += 1;
                break;
            }
            self.step(at, c).map_err(overflow(at))?;
            std::mem::swap(&mut self.clist, &mut self.nlist);
            self.nlist.clear();
            at += 1;
            if self.clist.is_empty() && !self.may_seed(scan, at) {
                break;
            }
        }
        for (i, c) in input.enumerate() {
            self.check(at + i, c)?;
        }
        debug!("run stopped at offset {} with weight {:?}", at, self.best);
        Ok(Outcome {
            weight: self.best.clone(),
            slots: self.best_slots.clone(),
        })
    }

    fn reset(&mut self) {
        self.clist.clear();
        self.nlist.clear();
        self.best = self.semiring.zero();
        self.best_slots.iter_mut().for_each(|s| *s = None);
    }

    fn check(&self, at: usize, c: char) -> Result<(), MatchError> {
        if self.program.alphabet.contains(c) {
            Ok(())
        } else {
            Err(MatchError::SymbolOutsideAlphabet {
                symbol: c,
                offset: at,
            })
        }
    }

    fn may_seed(&self, scan: Scan, at: usize) -> bool {
        match scan {
            Scan::Exact => at == 0,
            Scan::Anywhere => {
                self.semiring.restart_after_accept() || self.semiring.is_zero(&self.best)
            }
        }
    }

    fn seed(&mut self, at: usize) -> Result<(), Overflow> {
        let w = self.semiring.start(at);
        if self.semiring.is_zero(&w) {
            return Ok(());
        }
        self.scratch.iter_mut().for_each(|s| *s = None);
        self.clist
            .merge(&self.semiring, self.program.start, &w, &self.scratch)?;
        Ok(())
    }

    /// Follows every non-consuming edge out of the current threads.
    fn closure(&mut self, at: usize, at_end: bool) -> Result<(), Overflow> {
        let program = self.program;
        self.sources.clear();
        self.sources.extend_from_slice(self.clist.live());
        if self.captures {
            let (semiring, clist) = (&self.semiring, &self.clist);
            self.sources.sort_by(|&a, &b| match (clist.weight(a), clist.weight(b)) {
                (Some(wa), Some(wb)) if semiring.prefer(wb, wa) => Ordering::Less,
                (Some(wa), Some(wb)) if semiring.prefer(wa, wb) => Ordering::Greater,
                _ => Ordering::Equal,
            });
        }

        self.heap.clear();
        self.heap
            .extend(self.sources.iter().map(|&pc| Reverse((program.ranks[pc], pc))));
        while let Some(Reverse((_, pc))) = self.heap.pop() {
            let inst = &program.insts[pc];
            if let Inst::Assert(InstAssert { look, .. }) = *inst {
                if !look.holds(at, at_end) {
                    continue;
                }
            }
            let w = match self.clist.weight(pc) {
                Some(w) => w.clone(),
                None => continue,
            };
            for goto in epsilon_successors(inst) {
                if self.clist.add(&self.semiring, goto, &w)? {
                    self.heap.push(Reverse((program.ranks[goto], goto)));
                }
            }
        }

        if self.captures {
            self.prioritize(at, at_end);
        }
        Ok(())
    }

    /// Assigns capture rows along the closure in priority order. Sources are
    /// walked best first and each walk is depth first with goto1 before
    /// goto2; an address keeps the row of the first path that reaches it.
    fn prioritize(&mut self, at: usize, at_end: bool) {
        let program = self.program;
        for &pc in &self.order {
            self.visited[pc] = false;
        }
        self.order.clear();
        for i in 0..self.sources.len() {
            let source = self.sources[i];
            if self.visited[source] {
                continue;
            }
            self.scratch.copy_from_slice(self.clist.slots(source));
            self.stack.push(Frame::Explore(source));
            while let Some(frame) = self.stack.pop() {
                let pc = match frame {
                    Frame::Explore(pc) => pc,
                    Frame::Restore { slot, old } => {
                        self.scratch[slot] = old;
                        continue;
                    }
                };
                if self.visited[pc] {
                    continue;
                }
                self.visited[pc] = true;
                self.order.push(pc);
                self.clist.slots_mut(pc).copy_from_slice(&self.scratch);
                match program.insts[pc] {
                    Inst::Accept | Inst::Symbol(_) => {}
                    Inst::Split(InstSplit { goto1, goto2 }) => {
                        self.stack.push(Frame::Explore(goto2));
                        self.stack.push(Frame::Explore(goto1));
                    }
                    Inst::Jump(InstJump { goto }) => self.stack.push(Frame::Explore(goto)),
                    Inst::Save(InstSave { slot, goto }) => {
                        self.stack.push(Frame::Restore {
                            slot,
                            old: self.scratch[slot],
                        });
                        self.scratch[slot] = Some(at);
                        self.stack.push(Frame::Explore(goto));
                    }
                    Inst::Assert(InstAssert { look, goto }) => {
                        if look.holds(at, at_end) {
                            self.stack.push(Frame::Explore(goto));
                        }
                    }
                }
            }
        }
    }

    fn accept(&mut self) -> Result<(), Overflow> {
        for &pc in self.clist.live() {
            if !matches!(self.program.insts[pc], Inst::Accept) {
                continue;
            }
            let w = match self.clist.weight(pc) {
                Some(w) => w,
                None => continue,
            };
            if self.semiring.is_zero(&self.best) || self.semiring.prefer(&self.best, w) {
                self.best_slots.copy_from_slice(self.clist.slots(pc));
            }
            self.best = self.semiring.add(&self.best, w)?;
        }
        Ok(())
    }

    /// Advances every thread waiting on a symbol class containing `c`. When
    /// two threads land on the same address the one earlier in priority
    /// order keeps its captures unless `prefer` says otherwise.
    fn step(&mut self, at: usize, c: char) -> Result<(), Overflow> {
        let consumed = self.semiring.symbol(at, c);
        let threads = if self.captures {
            &self.order
        } else {
            self.clist.live()
        };
        for &pc in threads {
            let goto = match self.program.insts[pc] {
                Inst::Symbol(InstSymbol { ref class, goto }) if class.contains(c) => goto,
                _ => continue,
            };
            let w = match self.clist.weight(pc) {
                Some(w) => self.semiring.multiply(w, &consumed)?,
                None => continue,
            };
            if self.semiring.is_zero(&w) {
                continue;
            }
            self.nlist
                .merge(&self.semiring, goto, &w, self.clist.slots(pc))?;
        }
        Ok(())
    }
}

fn overflow(offset: usize) -> impl Fn(Overflow) -> MatchError {
    move |_| MatchError::Overflow { offset }
}
