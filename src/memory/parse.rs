//! Loads Hack machine-code files into instruction memory.
//!
//! A program file is a sequence of lines, each exactly 16 characters of
//! `0`/`1` in big-endian order, one instruction word per line:
//!
//! ```text
//! 0000000000000010
//! 1110110000010000
//! 0000000000000011
//! 1110000010010000
//! ```

use std::error;
use std::str::FromStr;
use std::{fmt, str::Lines};

use super::{Rom, Word, ROM_SIZE};

/// The number of binary digits in one instruction word line.
pub const WORD_WIDTH: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    InvalidLength { length: usize },
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseErrorKind::InvalidLength { length } => {
                write!(
                    f,
                    "expected {} binary digits, found {}",
                    WORD_WIDTH, length
                )
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseError {
    kind: ParseErrorKind,
    line_nr: usize,
}

impl ParseError {
    fn new(kind: ParseErrorKind, line_nr: usize) -> Self {
        Self { kind, line_nr }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "error [ln: {}]: {}", self.line_nr, self.kind)
    }
}

impl error::Error for ParseError {}

pub type Result<T, E = ParseError> = std::result::Result<T, E>;

/// Converts a 16-character big-endian bit pattern into a word.
///
/// Only `'0'` counts as a zero bit; every other character is read as a one
/// bit, a leniency kept from the original machine-code format.
pub fn parse_word(line: &str) -> Result<Word, ParseErrorKind> {
    if line.chars().count() != WORD_WIDTH {
        return Err(ParseErrorKind::InvalidLength {
            length: line.chars().count(),
        });
    }

    Ok(line
        .chars()
        .fold(0, |word, c| word << 1 | Word::from(c != '0')))
}

/// Parses a program source into instruction memory, one line at a time.
#[derive(Debug, Clone)]
pub struct Parser<'a> {
    lines: Lines<'a>,
    line_nr: usize,
    address: usize,
    rom: Rom,
}

impl<'a> Parser<'a> {
    /// Creates a new parser for `source` which will populate a zeroed ROM.
    pub fn new(source: &'a str) -> Self {
        Self {
            lines: source.lines(),
            line_nr: 0,
            address: 0,
            rom: Rom::default(),
        }
    }

    /// Consumes `self` and tries to parse the whole source into the ROM.
    ///
    /// Words are stored in file order starting at address 0; every address
    /// past the last parsed line is left at zero. Parsing stops once the
    /// ROM capacity is reached, even if lines remain.
    ///
    /// # Errors
    ///
    /// All errors which may occur are collected and returned at the end.
    pub fn parse(mut self) -> Result<Rom, Vec<ParseError>> {
        let mut errors = Vec::new();

        while let Some(res) = self.parse_next_line() {
            if let Err(err) = res {
                log::error!("{}", err);
                errors.push(err);
            }
        }

        if errors.is_empty() {
            Ok(self.rom)
        } else {
            Err(errors)
        }
    }

    /// Tries to parse the next line of the source. Each instruction word
    /// is located on its own line; blank lines are skipped.
    fn parse_next_line(&mut self) -> Option<Result<()>> {
        if self.address >= ROM_SIZE {
            return None;
        }

        let line = self.lines.next()?;
        self.line_nr += 1;

        if line.is_empty() {
            return Some(Ok(()));
        }

        match parse_word(line) {
            Ok(word) => {
                log::debug!("[{}] rom[{}] = {:#018b}", self.line_nr, self.address, word);
                self.rom.data[self.address] = word;
                self.address += 1;
                Some(Ok(()))
            }
            Err(kind) => Some(Err(ParseError::new(kind, self.line_nr))),
        }
    }
}

impl FromStr for Rom {
    type Err = Vec<ParseError>;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Parser::new(s).parse()
    }
}

impl Rom {
    /// Reads a program file and parses it into instruction memory.
    ///
    /// A missing or unreadable file is an error; running an all-zero
    /// program is rarely what anyone wants.
    pub fn from_file<P: AsRef<std::path::Path>>(path: P) -> color_eyre::eyre::Result<Self> {
        use color_eyre::eyre::{eyre, WrapErr};

        let source = std::fs::read_to_string(path.as_ref())
            .wrap_err_with(|| format!("failed to read program file `{}`", path.as_ref().display()))?;
        source
            .parse()
            .map_err(|errors: Vec<ParseError>| eyre!("program file contained {} invalid lines", errors.len()))
    }
}
