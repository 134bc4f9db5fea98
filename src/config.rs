/// Limits and alphabet applied when compiling a pattern.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Config {
    /// Upper bound on the number of instructions in a compiled program.
    pub max_program_size: usize,
    /// Upper bound on explicit capture groups (group 0 is not counted).
    pub max_capture_groups: usize,
    /// Upper bound on how deeply groups and repetitions may nest.
    pub max_nest: usize,
    pub alphabet: Alphabet,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            max_program_size: 1 << 16,
            max_capture_groups: 256,
            max_nest: 250,
            alphabet: Alphabet::Unicode,
        }
    }
}

/// The set of symbols a program accepts as input.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Default)]
pub enum Alphabet {
    #[default]
    Unicode,
    /// U+0000 through U+00FF.
    Latin1,
    Ascii,
}

impl Alphabet {
    pub fn contains(self, c: char) -> bool {
        match self {
            Alphabet::Unicode => true,
            Alphabet::Latin1 => (c as u32) <= 0xFF,
            Alphabet::Ascii => c.is_ascii(),
        }
    }
}
