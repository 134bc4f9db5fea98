use std::{collections::VecDeque, result};

use log::debug;

use crate::{
    ast,
    automata::hir::{Hir, Lowering},
    automata::program::{
        Inst, InstAssert, InstJump, InstPtr, InstSave, InstSplit, InstSymbol, Look, Program,
        SymbolClass,
    },
    config::Config,
    errors::CompileError,
};

#[derive(Debug, Eq, PartialEq)]
enum MaybeInst {
    Compiled(Inst),
    Uncompiled(InstHole),
    Split,
    Split1(InstPtr),
    Split2(InstPtr),
}

impl MaybeInst {
    fn unwrap(self) -> Inst {
        match self {
            MaybeInst::Compiled(inst) => inst,
            _ => unreachable!(
                "must be called on a compiled instruction, \
                 instead it was called on: {:?}",
                self
            ),
        }
    }

    fn fill_split_goto1(&mut self, goto1: InstPtr) {
        let half_filled = match *self {
            MaybeInst::Split => goto1,
            _ => unreachable!(
                "must be called on Split instruction, \
                 instead it was called on: {:?}",
                self
            ),
        };
        *self = MaybeInst::Split1(half_filled);
    }

    fn fill_split_goto2(&mut self, goto2: InstPtr) {
        let half_filled = match *self {
            MaybeInst::Split => goto2,
            _ => unreachable!(
                "must be called on Split instruction, \
                 instead it was called on: {:?}",
                self
            ),
        };
        *self = MaybeInst::Split2(half_filled);
    }

    fn fill(&mut self, goto: InstPtr) {
        let maybe_inst = match *self {
            MaybeInst::Uncompiled(ref hole) => MaybeInst::Compiled(hole.fill(goto)),
            MaybeInst::Split => MaybeInst::Split1(goto),
            MaybeInst::Split1(goto1) => {
                MaybeInst::Compiled(Inst::Split(InstSplit { goto1, goto2: goto }))
            }
            MaybeInst::Split2(goto2) => {
                MaybeInst::Compiled(Inst::Split(InstSplit { goto1: goto, goto2 }))
            }
            MaybeInst::Compiled(_) => unreachable!("compiled cant be filled"),
        };
        *self = maybe_inst
    }
}

#[derive(Debug, Eq, PartialEq)]
enum InstHole {
    Symbol { class: SymbolClass },
    Save { slot: usize },
    Assert { look: Look },
    Jump,
}

impl InstHole {
    fn fill(&self, goto: InstPtr) -> Inst {
        match *self {
            InstHole::Symbol { ref class } => Inst::Symbol(InstSymbol {
                class: class.clone(),
                goto,
            }),
            InstHole::Save { slot } => Inst::Save(InstSave { slot, goto }),
            InstHole::Assert { look } => Inst::Assert(InstAssert { look, goto }),
            InstHole::Jump => Inst::Jump(InstJump { goto }),
        }
    }
}

struct Patch {
    hole: Hole,
    entry: InstPtr,
}

enum Hole {
    None,
    One(InstPtr),
    Many(Vec<Hole>),
}

impl Hole {
    fn new(holes: Vec<Hole>) -> Hole {
        let mut holes: Vec<Hole> = holes
            .into_iter()
            .filter(|h| !matches!(h, Hole::None))
            .collect();
        match holes.len() {
            0 => Hole::None,
            1 => holes.pop().unwrap_or(Hole::None),
            _ => Hole::Many(holes),
        }
    }
}

type Result<T> = result::Result<T, CompileError>;

pub struct Compiler {
    insts: Vec<MaybeInst>,
    config: Config,
}

impl Default for Compiler {
    fn default() -> Self {
        Compiler::new(Config::default())
    }
}

impl Compiler {
    pub fn new(config: Config) -> Compiler {
        Compiler {
            insts: vec![],
            config,
        }
    }

    pub fn compile(mut self, ast: &ast::Ast) -> Result<Program> {
        let mut group_names = vec![None];
        collect_groups(ast, &mut group_names);
        let groups = group_names.len() - 1;
        if groups > self.config.max_capture_groups {
            return Err(CompileError::TooManyCaptureGroups {
                limit: self.config.max_capture_groups,
                found: groups,
            });
        }

        let body = Lowering::new(self.config.max_program_size).lower(ast)?;
        let whole = Hir::Capture {
            index: 0,
            hir: Box::new(body),
        };
        let Patch { hole, entry } = self.c(&whole)?;
        self.fill_to_next(hole);
        self.push_compiled(Inst::Accept)?;

        let insts = self
            .insts
            .into_iter()
            .map(|i| i.unwrap())
            .collect::<Vec<_>>();
        let ranks = epsilon_ranks(&insts);
        debug!(
            "compiled {} instructions with {} capture groups",
            insts.len(),
            groups
        );
        Ok(Program {
            insts,
            start: entry,
            ranks,
            group_names,
            alphabet: self.config.alphabet,
        })
    }

    fn push(&mut self, inst: MaybeInst) -> Result<InstPtr> {
        if self.insts.len() >= self.config.max_program_size {
            return Err(CompileError::ProgramTooLarge {
                limit: self.config.max_program_size,
            });
        }
        let pc = self.insts.len();
        self.insts.push(inst);
        Ok(pc)
    }

    fn push_compiled(&mut self, inst: Inst) -> Result<InstPtr> {
        self.push(MaybeInst::Compiled(inst))
    }

    fn push_hole(&mut self, hole: InstHole) -> Result<Patch> {
        let pc = self.push(MaybeInst::Uncompiled(hole))?;
        Ok(Patch {
            hole: Hole::One(pc),
            entry: pc,
        })
    }

    fn push_split_hole(&mut self) -> Result<Hole> {
        let pc = self.push(MaybeInst::Split)?;
        Ok(Hole::One(pc))
    }

    /// Fills one side of a fresh split, leaving the other side as the hole.
    fn fill_split(&mut self, hole: Hole, goto1: Option<InstPtr>, goto2: Option<InstPtr>) -> Hole {
        match hole {
            Hole::None => Hole::None,
            Hole::One(pc) => match (goto1, goto2) {
                (Some(goto1), None) => {
                    self.insts[pc].fill_split_goto1(goto1);
                    Hole::One(pc)
                }
                (None, Some(goto2)) => {
                    self.insts[pc].fill_split_goto2(goto2);
                    Hole::One(pc)
                }
                _ => unreachable!("exactly one split branch must be filled"),
            },
            Hole::Many(holes) => {
                let mut new_holes = vec![];
                for hole in holes {
                    new_holes.push(self.fill_split(hole, goto1, goto2));
                }
                Hole::new(new_holes)
            }
        }
    }

    fn fill_to_next(&mut self, hole: Hole) {
        let next = self.insts.len();
        self.fill(hole, next);
    }

    fn fill(&mut self, hole: Hole, goto: InstPtr) {
        match hole {
            Hole::None => {}
            Hole::One(pc) => self.insts[pc].fill(goto),
            Hole::Many(holes) => {
                for hole in holes {
                    self.fill(hole, goto)
                }
            }
        }
    }

    fn c(&mut self, hir: &Hir) -> Result<Patch> {
        match *hir {
            Hir::Empty => self.c_empty(),
            Hir::Class(ref class) => self.push_hole(InstHole::Symbol {
                class: class.clone(),
            }),
            Hir::Look(look) => self.push_hole(InstHole::Assert { look }),
            Hir::Concat(ref hirs) => self.c_concat(hirs),
            Hir::Alternate(ref hirs) => self.c_alternation(hirs),
            Hir::Capture { index, ref hir } => self.c_capture(index, hir),
            Hir::Optional { ref hir, greedy } => self.c_zero_or_one(hir, greedy),
            Hir::UpTo {
                ref hir,
                count,
                greedy,
            } => self.c_up_to(hir, count, greedy),
            Hir::Star { ref hir, greedy } => self.c_zero_or_more(hir, greedy),
        }
    }

    fn c_empty(&mut self) -> Result<Patch> {
        self.push_hole(InstHole::Jump)
    }

    fn c_concat(&mut self, concat: &[Hir]) -> Result<Patch> {
        let mut iter = concat.iter();
        let Patch { mut hole, entry } = match iter.next() {
            Some(first) => self.c(first)?,
            None => return self.c_empty(),
        };
        for e in iter {
            let p = self.c(e)?;
            self.fill(hole, p.entry);
            hole = p.hole;
        }
        Ok(Patch { hole, entry })
    }

    /// `a|b|c` becomes a chain of splits, each one's second branch leading to
    /// the next split (or the last alternative).
    fn c_alternation(&mut self, alt: &[Hir]) -> Result<Patch> {
        let (last, init) = match alt.split_last() {
            Some(parts) => parts,
            None => return self.c_empty(),
        };
        let entry = self.insts.len();
        let mut holes = vec![];
        let mut pending: Option<Hole> = None;

        for hir in init {
            let split_pc = self.insts.len();
            if let Some(prev) = pending.take() {
                self.fill(prev, split_pc);
            }
            let split = self.push_split_hole()?;
            let Patch { hole, entry } = self.c(hir)?;
            holes.push(hole);
            pending = Some(self.fill_split(split, Some(entry), None));
        }
        let Patch { hole, entry: last_entry } = self.c(last)?;
        holes.push(hole);
        if let Some(prev) = pending.take() {
            self.fill(prev, last_entry);
        }
        Ok(Patch {
            hole: Hole::new(holes),
            entry,
        })
    }

    fn c_capture(&mut self, index: usize, hir: &Hir) -> Result<Patch> {
        let open = self.push_hole(InstHole::Save { slot: 2 * index })?;
        let inner = self.c(hir)?;
        self.fill(open.hole, inner.entry);
        let close = self.push_hole(InstHole::Save {
            slot: 2 * index + 1,
        })?;
        self.fill(inner.hole, close.entry);
        Ok(Patch {
            hole: close.hole,
            entry: open.entry,
        })
    }

    fn c_zero_or_one(&mut self, hir: &Hir, greedy: bool) -> Result<Patch> {
        let split_entry = self.insts.len();
        let split = self.push_split_hole()?;
        let Patch { hole, entry } = self.c(hir)?;
        let split_hole = if greedy {
            self.fill_split(split, Some(entry), None)
        } else {
            self.fill_split(split, None, Some(entry))
        };
        Ok(Patch {
            hole: Hole::new(vec![split_hole, hole]),
            entry: split_entry,
        })
    }

    /// A run of `count` optional copies. Each copy's split skips to the end,
    /// each copy's body continues into the next split.
    fn c_up_to(&mut self, hir: &Hir, count: u32, greedy: bool) -> Result<Patch> {
        if count == 0 {
            return self.c_empty();
        }
        let entry = self.insts.len();
        let mut holes = vec![];
        let mut pending: Option<Hole> = None;
        for _ in 0..count {
            if let Some(prev) = pending.take() {
                self.fill_to_next(prev);
            }
            let split = self.push_split_hole()?;
            let Patch { hole, entry: body } = self.c(hir)?;
            holes.push(if greedy {
                self.fill_split(split, Some(body), None)
            } else {
                self.fill_split(split, None, Some(body))
            });
            pending = Some(hole);
        }
        holes.extend(pending);
        Ok(Patch {
            hole: Hole::new(holes),
            entry,
        })
    }

    fn c_zero_or_more(&mut self, hir: &Hir, greedy: bool) -> Result<Patch> {
        let split_entry = self.insts.len();
        let split = self.push_split_hole()?;
        let Patch { hole, entry } = self.c(hir)?;
        self.fill(hole, split_entry);
        let split_hole = if greedy {
            self.fill_split(split, Some(entry), None)
        } else {
            self.fill_split(split, None, Some(entry))
        };
        Ok(Patch {
            hole: split_hole,
            entry: split_entry,
        })
    }
}

/// Records every capture group's name at its index; index 0 is preset.
fn collect_groups(ast: &ast::Ast, names: &mut Vec<Option<String>>) {
    match *ast {
        ast::Ast::Group(ref group) => {
            if let ast::GroupKind::Capture { index, ref name } = group.kind {
                if names.len() <= index {
                    names.resize(index + 1, None);
                }
                names[index] = name.clone();
            }
            collect_groups(&group.ast, names);
        }
        ast::Ast::Concat(ref concat) => concat.asts().iter().for_each(|a| collect_groups(a, names)),
        ast::Ast::Alternation(ref alt) => alt.asts.iter().for_each(|a| collect_groups(a, names)),
        ast::Ast::Repetition(ref rep) => collect_groups(&rep.ast, names),
        ast::Ast::Empty(_)
        | ast::Ast::Literal(_)
        | ast::Ast::Dot(_)
        | ast::Ast::Class(_)
        | ast::Ast::Assertion(_) => {}
    }
}

/// Successors reachable without consuming input.
pub fn epsilon_successors(inst: &Inst) -> impl Iterator<Item = InstPtr> {
    let (a, b) = match *inst {
        Inst::Split(InstSplit { goto1, goto2 }) => (Some(goto1), Some(goto2)),
        Inst::Jump(InstJump { goto })
        | Inst::Save(InstSave { goto, .. })
        | Inst::Assert(InstAssert { goto, .. }) => (Some(goto), None),
        Inst::Accept | Inst::Symbol(_) => (None, None),
    };
    a.into_iter().chain(b)
}

/// Kahn's algorithm over the non-consuming edges: every epsilon edge goes
/// from a lower rank to a higher one.
fn epsilon_ranks(insts: &[Inst]) -> Vec<u32> {
    let mut indegree = vec![0usize; insts.len()];
    for inst in insts {
        for next in epsilon_successors(inst) {
            indegree[next] += 1;
        }
    }
    let mut queue: VecDeque<InstPtr> = (0..insts.len()).filter(|&pc| indegree[pc] == 0).collect();
    let mut ranks = vec![0u32; insts.len()];
    let mut rank = 0u32;
    while let Some(pc) = queue.pop_front() {
        ranks[pc] = rank;
        rank += 1;
        for next in epsilon_successors(&insts[pc]) {
            indegree[next] -= 1;
            if indegree[next] == 0 {
                queue.push_back(next);
            }
        }
    }
    if rank as usize != insts.len() {
        unreachable!("lowering left a cycle of non-consuming instructions");
    }
    ranks
}

#[cfg(test)]
mod test {
    use super::Compiler;
    use crate::automata::program::{self, Inst, Program, SymbolClass};
    use crate::config::Config;
    use crate::errors::CompileError;
    use crate::{ast::parser::Parser, ast::Ast};
    use pretty_assertions::assert_eq;
    use std::result::Result;

    fn p(s: &str) -> Ast {
        Parser::new(s.to_string())
            .parse()
            .expect("should be valid ast")
    }

    fn c(s: &str) -> Result<Program, CompileError> {
        Compiler::default().compile(&p(s))
    }

    fn insts(s: &str) -> Vec<Inst> {
        c(s).expect("should compile").insts
    }

    fn i_split(goto1: usize, goto2: usize) -> program::Inst {
        Inst::Split(program::InstSplit { goto1, goto2 })
    }
    fn i_char(c: char, goto: usize) -> program::Inst {
        Inst::Symbol(program::InstSymbol {
            class: SymbolClass::single(c),
            goto,
        })
    }
    fn i_save(slot: usize, goto: usize) -> program::Inst {
        Inst::Save(program::InstSave { slot, goto })
    }
    fn i_jump(goto: usize) -> program::Inst {
        Inst::Jump(program::InstJump { goto })
    }
    fn i_accept() -> program::Inst {
        Inst::Accept
    }

    /// Wraps a body compiled at addresses 1.. with the group 0 saves.
    fn whole(mut body: Vec<program::Inst>) -> Vec<program::Inst> {
        let end = body.len() + 1;
        body.insert(0, i_save(0, 1));
        body.push(i_save(1, end + 1));
        body.push(i_accept());
        body
    }

    #[test]
    fn concat() {
        assert_eq!(insts("ab"), whole(vec![i_char('a', 2), i_char('b', 3)]));
    }

    #[test]
    fn alternate() {
        assert_eq!(
            insts("a|b|c"),
            whole(vec![
                i_split(2, 3),
                i_char('a', 6),
                i_split(4, 5),
                i_char('b', 6),
                i_char('c', 6),
            ])
        );
        assert_eq!(
            insts("a||c"),
            whole(vec![
                i_split(2, 3),
                i_char('a', 6),
                i_split(4, 5),
                i_jump(6),
                i_char('c', 6),
            ])
        );
    }

    #[test]
    fn repeat_zero_or_many() {
        assert_eq!(insts("a*"), whole(vec![i_split(2, 3), i_char('a', 1)]));
        assert_eq!(insts("a*?"), whole(vec![i_split(3, 2), i_char('a', 1)]));
        assert_eq!(
            insts("a(?:bc)*"),
            whole(vec![
                i_char('a', 2),
                i_split(3, 5),
                i_char('b', 4),
                i_char('c', 2),
            ])
        );
    }

    #[test]
    fn repeat_zero_or_one() {
        assert_eq!(insts("a?"), whole(vec![i_split(2, 3), i_char('a', 3)]));
    }

    #[test]
    fn repeat_up_to() {
        assert_eq!(
            insts("a{0,2}"),
            whole(vec![i_split(2, 5), i_char('a', 3), i_split(4, 5), i_char('a', 5)])
        );
        assert_eq!(
            insts("a{0,2}?"),
            whole(vec![i_split(5, 2), i_char('a', 3), i_split(5, 4), i_char('a', 5)])
        );
        let long = c("a{0,30000}").expect("should compile");
        assert_eq!(long.len(), 60003);
    }

    #[test]
    fn repeat_one_or_many() {
        assert_eq!(
            insts("a+"),
            whole(vec![i_char('a', 2), i_split(3, 4), i_char('a', 2)])
        );
    }

    #[test]
    fn capture_groups_save_slots() {
        assert_eq!(
            insts("(a)"),
            whole(vec![i_save(2, 2), i_char('a', 3), i_save(3, 4)])
        );
        let program = c("(?P<first>a)(b)(?<third>c)").expect("should compile");
        assert_eq!(
            program.group_names,
            vec![None, Some("first".to_string()), None, Some("third".to_string())]
        );
        assert_eq!(program.slots(), 8);
        assert_eq!(program.group_index("third"), Some(3));
    }

    #[test]
    fn epsilon_edges_increase_rank() {
        for pattern in ["(a|b)*c", "a*?b+", "((a?)+)*", "(?:|)(?:|)x", "^a|b$"] {
            let program = c(pattern).expect("should compile");
            for (pc, inst) in program.insts.iter().enumerate() {
                for next in super::epsilon_successors(inst) {
                    assert!(
                        program.ranks[pc] < program.ranks[next],
                        "{}: edge {} -> {} goes backwards",
                        pattern,
                        pc,
                        next
                    );
                }
            }
        }
    }

    #[test]
    fn limits() {
        let config = Config {
            max_capture_groups: 2,
            ..Config::default()
        };
        assert_eq!(
            Compiler::new(config).compile(&p("(a)(b)(c)")),
            Err(CompileError::TooManyCaptureGroups { limit: 2, found: 3 })
        );

        let config = Config {
            max_program_size: 8,
            ..Config::default()
        };
        assert_eq!(
            Compiler::new(config.clone()).compile(&p("abcdefgh")),
            Err(CompileError::ProgramTooLarge { limit: 8 })
        );
        assert!(Compiler::new(config).compile(&p("abcd")).is_ok());
    }
}
