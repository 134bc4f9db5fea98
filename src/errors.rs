use crate::ast;

/// A pattern that never yields a usable [`Program`](crate::Program).
#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ast::Error),
    #[error(transparent)]
    Compile(#[from] CompileError),
}

#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
pub enum CompileError {
    #[error("pattern has {found} capture groups, the limit is {limit}")]
    TooManyCaptureGroups { limit: usize, found: usize },
    #[error("compiled program exceeds the limit of {limit} instructions")]
    ProgramTooLarge { limit: usize },
}

/// Aborts an in-progress match. Offsets are input symbol indices.
#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
pub enum MatchError {
    #[error("weight overflow at input offset {offset}")]
    Overflow { offset: usize },
    #[error("symbol {symbol:?} at input offset {offset} is outside the program's alphabet")]
    SymbolOutsideAlphabet { symbol: char, offset: usize },
}

/// A semiring operation whose result is not representable in its weight type.
#[derive(Debug, Clone, Copy, Eq, PartialEq, thiserror::Error)]
#[error("weight overflow")]
pub struct Overflow;
