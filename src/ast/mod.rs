use std::fmt;
pub mod parser;

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Ast {
    Empty(Empty),
    Concat(Concat),
    Repetition(Repetition),
    Literal(Literal),
    Dot(Dot),
    Class(Class),
    Assertion(Assertion),
    Group(Group),
    Alternation(Alternation),
}

impl Ast {
    pub fn span(&self) -> Span {
        match *self {
            Ast::Empty(ref x) => x.span,
            Ast::Concat(ref x) => x.span,
            Ast::Repetition(ref x) => Span::new(x.ast.span().start, x.op.span.end),
            Ast::Literal(ref x) => x.span,
            Ast::Dot(ref x) => x.span,
            Ast::Class(ref x) => x.span,
            Ast::Assertion(ref x) => x.span,
            Ast::Group(ref x) => x.span,
            Ast::Alternation(ref x) => x.span,
        }
    }
}

#[derive(PartialEq, Debug, Eq, Clone)]
pub struct Alternation {
    span: Span,
    pub asts: Vec<Ast>,
}

impl Alternation {
    pub fn into_ast(mut self) -> Ast {
        match self.asts.len() {
            0 => Ast::Empty(Empty { span: self.span }),
            1 => self.asts.pop().unwrap_or(Ast::Empty(Empty { span: self.span })),
            _ => Ast::Alternation(self),
        }
    }
}

#[derive(PartialEq, Debug, Eq, Clone)]
pub struct Group {
    span: Span,
    pub kind: GroupKind,
    pub ast: Box<Ast>,
}

impl Group {
    /// The capture index of this group, if it captures.
    pub fn capture_index(&self) -> Option<usize> {
        match self.kind {
            GroupKind::Capture { index, .. } => Some(index),
            GroupKind::NonCapturing => None,
        }
    }
}

#[derive(PartialEq, Debug, Eq, Clone)]
pub enum GroupKind {
    /// `(a)` or `(?P<name>a)`. Indices start at 1; 0 is the whole match.
    Capture { index: usize, name: Option<String> },
    /// `(?:a)`
    NonCapturing,
}

#[derive(PartialEq, Debug, Eq, Clone)]
pub struct Empty {
    span: Span,
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Concat {
    pub span: Span,
    pub asts: Vec<Ast>,
}
impl Concat {
    fn new(span: Span) -> Concat {
        Concat { span, asts: vec![] }
    }

    fn into_ast(mut self) -> Ast {
        match self.asts.len() {
            0 => Ast::Empty(Empty { span: self.span }),
            1 => self.asts.pop().unwrap_or(Ast::Empty(Empty { span: self.span })),
            _ => Ast::Concat(self),
        }
    }

    pub fn asts(&self) -> &[Ast] {
        self.asts.as_ref()
    }
}

#[derive(PartialEq, Debug, Eq, Clone)]
pub struct Literal {
    span: Span,
    pub kind: LiteralKind,
    pub char: char,
}

#[derive(PartialEq, Debug, Eq, Clone, Copy)]
pub enum LiteralKind {
    Verbatim,    // `a` or `0`
    Punctuation, // escaped `\*` or `\[`
    Special,     // `\n`, `\t`, `\x41`, `\u{263a}`
}

#[derive(PartialEq, Debug, Eq, Clone)]
pub struct Dot {
    span: Span,
}

/// A bracketed class `[a-z_]` / `[^0-9]`, or a bare Perl class like `\d`.
#[derive(PartialEq, Debug, Eq, Clone)]
pub struct Class {
    span: Span,
    pub negated: bool,
    pub items: Vec<ClassItem>,
}

#[derive(PartialEq, Debug, Eq, Clone, Copy)]
pub enum ClassItem {
    Literal(char),
    Range(char, char),
    Perl(PerlClass),
}

#[derive(PartialEq, Debug, Eq, Clone, Copy)]
pub struct PerlClass {
    pub kind: PerlClassKind,
    pub negated: bool,
}

#[derive(PartialEq, Debug, Eq, Clone, Copy)]
pub enum PerlClassKind {
    Digit, // \d
    Word,  // \w
    Space, // \s
}

impl PerlClassKind {
    /// ASCII-only ranges for the class.
    pub fn ranges(self) -> &'static [(char, char)] {
        match self {
            PerlClassKind::Digit => &[('0', '9')],
            PerlClassKind::Word => &[('0', '9'), ('A', 'Z'), ('_', '_'), ('a', 'z')],
            PerlClassKind::Space => &[('\t', '\r'), (' ', ' ')],
        }
    }
}

#[derive(PartialEq, Debug, Eq, Clone)]
pub struct Assertion {
    span: Span,
    pub kind: AssertionKind,
}

#[derive(PartialEq, Debug, Eq, Clone, Copy)]
pub enum AssertionKind {
    StartText, // ^
    EndText,   // $
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Repetition {
    pub op: RepetitionOp,
    pub greedy: bool,
    pub ast: Box<Ast>,
}
impl Repetition {
    /// Minimum and (if bounded) maximum number of iterations.
    pub fn bounds(&self) -> (u32, Option<u32>) {
        match self.op.kind {
            RepetitionKind::ZeroOrOne => (0, Some(1)),
            RepetitionKind::ZeroOrMore => (0, None),
            RepetitionKind::OneOrMore => (1, None),
            RepetitionKind::Range(RepetitionRange::Exactly(n)) => (n, Some(n)),
            RepetitionKind::Range(RepetitionRange::AtLeast(n)) => (n, None),
            RepetitionKind::Range(RepetitionRange::Bounded(m, n)) => (m, Some(n)),
        }
    }
}

#[derive(PartialEq, Debug, Eq, Clone)]
pub struct RepetitionOp {
    span: Span,
    pub kind: RepetitionKind,
}

#[derive(PartialEq, Debug, Eq, Copy, Clone)]
pub enum RepetitionKind {
    ZeroOrOne,
    ZeroOrMore,
    OneOrMore,
    Range(RepetitionRange),
}

#[derive(PartialEq, Debug, Eq, Copy, Clone)]
pub enum RepetitionRange {
    Exactly(u32),      // {m}
    AtLeast(u32),      // {m,}
    Bounded(u32, u32), // {m,n}
}

#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub struct Position {
    pub offset: usize,
}
impl Position {
    pub fn new(offset: usize) -> Position {
        Position { offset }
    }
}

#[derive(Clone, Copy, Eq, PartialEq)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    pub fn point(pos: Position) -> Span {
        Span {
            start: pos,
            end: pos,
        }
    }

    pub(crate) fn new(start: Position, end: Position) -> Span {
        Span { start, end }
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Span({:?}, {:?})", self.start, self.end)
    }
}

/// A malformed pattern, reported with the offending byte span.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[error("{kind} at offset {} in pattern `{pattern}`", .span.start.offset)]
pub struct Error {
    kind: ErrorKind,
    pattern: String,
    span: Span,
}

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn span(&self) -> &Span {
        &self.span
    }
}

#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum ErrorKind {
    /// `(a` or `a)`
    #[error("unbalanced group")]
    UnbalancedGroup,
    /// `*a`, `a{2,1}`, `a{x}`
    #[error("invalid quantifier")]
    InvalidQuantifier,
    /// `(?x)`, trailing `\`
    #[error("unexpected token")]
    UnexpectedToken,
    /// `[ab`
    #[error("unterminated class")]
    UnterminatedClass,
    #[error("invalid escape sequence")]
    InvalidEscape,
    /// `[z-a]`
    #[error("invalid class range")]
    InvalidClassRange,
    #[error("invalid group name")]
    InvalidGroupName,
    #[error("duplicate group name")]
    DuplicateGroupName,
    /// Groups and repetitions stacked deeper than the parser's nest limit.
    #[error("nesting limit of {0} exceeded")]
    NestLimitExceeded(usize),
}
