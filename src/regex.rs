use std::sync::Arc;

use crate::ast::parser::Parser;
use crate::automata::compiler::Compiler;
use crate::automata::program::Program;
use crate::config::{Alphabet, Config};
use crate::errors::{Error, MatchError};
use crate::executor::Executor;
use crate::extract::{Captures, FromOutcome, Match};
use crate::semiring::{Boolean, Counting, LeftmostLongest, Semiring};

/// A compiled pattern. Cloning is cheap and clones share one [`Program`].
#[derive(Clone, Debug)]
pub struct Regex {
    pattern: Arc<str>,
    program: Arc<Program>,
}

impl Regex {
    pub fn new(pat: &str) -> Result<Regex, Error> {
        RegexBuilder::new(pat).build()
    }

    pub fn builder(pat: &str) -> RegexBuilder {
        RegexBuilder::new(pat)
    }

    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    /// Whether the whole of `s` matches.
    pub fn matches(&self, s: &str) -> Result<bool, MatchError> {
        self.extract(s, Boolean::exact())
    }

    /// Whether some substring of `s` matches.
    pub fn is_match(&self, s: &str) -> Result<bool, MatchError> {
        self.extract(s, Boolean::search())
    }

    /// Number of distinct ways the pattern derives the whole of `s`.
    pub fn count(&self, s: &str) -> Result<u64, MatchError> {
        self.extract(s, Counting::exact())
    }

    /// Number of derivations summed over every substring of `s`.
    pub fn count_all(&self, s: &str) -> Result<u64, MatchError> {
        self.extract(s, Counting::search())
    }

    /// The leftmost-longest match, in symbol offsets.
    pub fn find(&self, s: &str) -> Result<Option<Match>, MatchError> {
        self.extract(s, LeftmostLongest)
    }

    /// Group spans of the leftmost-longest match.
    pub fn captures(&self, s: &str) -> Result<Option<Captures>, MatchError> {
        self.extract(s, LeftmostLongest)
    }

    /// The total weight of `s` under any semiring.
    pub fn weigh<S: Semiring>(&self, s: &str, semiring: S) -> Result<S::Weight, MatchError> {
        Executor::new(&self.program, semiring)
            .run(s.chars())
            .map(|o| o.weight)
    }

    pub fn extract<S, T>(&self, s: &str, semiring: S) -> Result<T, MatchError>
    where
        S: Semiring,
        T: FromOutcome<S::Weight>,
    {
        let mut exec = if T::CAPTURES {
            Executor::with_captures(&self.program, semiring)
        } else {
            Executor::new(&self.program, semiring)
        };
        let outcome = exec.run(s.chars())?;
        Ok(T::from_outcome(outcome, &self.program))
    }
}

#[derive(Clone, Debug)]
pub struct RegexBuilder {
    pattern: String,
    config: Config,
}

impl RegexBuilder {
    pub fn new(pat: &str) -> RegexBuilder {
        RegexBuilder {
            pattern: pat.to_owned(),
            config: Config::default(),
        }
    }

    pub fn max_program_size(&mut self, limit: usize) -> &mut RegexBuilder {
        self.config.max_program_size = limit;
        self
    }

    pub fn max_capture_groups(&mut self, limit: usize) -> &mut RegexBuilder {
        self.config.max_capture_groups = limit;
        self
    }

    pub fn max_nest(&mut self, limit: usize) -> &mut RegexBuilder {
        self.config.max_nest = limit;
        self
    }

    pub fn alphabet(&mut self, alphabet: Alphabet) -> &mut RegexBuilder {
        self.config.alphabet = alphabet;
        self
    }

    pub fn build(&self) -> Result<Regex, Error> {
        let ast = Parser::new(self.pattern.clone())
            .nest_limit(self.config.max_nest)
            .parse()?;
        let program = Compiler::new(self.config.clone()).compile(&ast)?;
        Ok(Regex {
            pattern: self.pattern.as_str().into(),
            program: Arc::new(program),
        })
    }
}
