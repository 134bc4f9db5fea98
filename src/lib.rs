//! Regular expressions whose matcher is generic over a weight semiring.
//!
//! One compiled [`Program`] answers different questions depending on the
//! semiring it runs under: [`Boolean`] for whether it matches, [`Counting`]
//! for how many ways, [`LeftmostLongest`] for where.
//!
//! ```
//! use semiregex::{compile, run, Counting};
//!
//! let program = compile("(a|a)*").unwrap();
//! assert_eq!(run(&program, "aa".chars(), Counting::exact()), Ok(4));
//! ```

pub mod ast;
pub mod automata;
pub mod config;
pub mod errors;
pub mod executor;
pub mod extract;
pub mod regex;
pub mod semiring;

pub use ast::Error as ParseError;
pub use automata::program::Program;
pub use config::{Alphabet, Config};
pub use errors::{CompileError, Error, MatchError, Overflow};
pub use extract::{Captures, FromOutcome, Match, Outcome};
pub use regex::{Regex, RegexBuilder};
pub use semiring::{Boolean, Counting, Extent, LeftmostLongest, Scan, Semiring, Tropical};

/// Parses and compiles `pattern` with the default [`Config`].
pub fn compile(pattern: &str) -> Result<Program, Error> {
    let config = Config::default();
    let ast = ast::parser::Parser::new(pattern.to_owned())
        .nest_limit(config.max_nest)
        .parse()?;
    Ok(automata::compiler::Compiler::new(config).compile(&ast)?)
}

/// Runs `program` over `input` and returns the total weight of its
/// accepted derivations under `semiring`.
pub fn run<S, I>(program: &Program, input: I, semiring: S) -> Result<S::Weight, MatchError>
where
    S: Semiring,
    I: IntoIterator<Item = char>,
{
    executor::Executor::new(program, semiring)
        .run(input)
        .map(|o| o.weight)
}
