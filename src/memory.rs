use std::error;
use std::fmt;

pub mod parse;

pub type Word = u16; // 2 bytes

/// Data memory: general RAM, screen bitmap and keyboard register.
pub const RAM_SIZE: usize = 24577;
/// Instruction memory, 2^15 words.
pub const ROM_SIZE: usize = 32768;

/// First word of the memory-mapped screen bitmap.
pub const SCREEN_START: Word = 16384;
/// Last word of the memory-mapped screen bitmap.
pub const SCREEN_END: Word = 24575;
/// The keyboard register. Holds the ASCII code of the pressed key, or 0.
pub const KEYBOARD: Word = 24576;

/// Screen geometry: 512x256 pixels, one bit per pixel, 32 words per row.
pub const SCREEN_WIDTH: usize = 512;
pub const SCREEN_HEIGHT: usize = 256;
pub const WORDS_PER_ROW: usize = 32;

/// Data memory (RAM)
pub type Ram = Memory<RAM_SIZE>;
/// Instruction memory (ROM)
pub type Rom = Memory<ROM_SIZE>;

/// Returned when an address falls outside the memory it was issued to.
///
/// Carries the capacity so the fatal diagnostic can name both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutOfBounds {
    pub capacity: usize,
    pub address: Word,
}

impl fmt::Display for OutOfBounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "memory size: {} | tried to access location {}",
            self.capacity, self.address
        )
    }
}

impl error::Error for OutOfBounds {}

/// Emulates a flat word-addressed memory for use with the CPU
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Memory<const S: usize> {
    /// The actual data of the memory
    pub data: [Word; S],
}

impl<const S: usize> Default for Memory<S> {
    /// Initializes the memory to all zeroes
    fn default() -> Self {
        Memory { data: [0; S] }
    }
}

impl<const S: usize> Memory<S> {
    /// Reads a word from the memory
    pub fn read(&self, address: Word) -> Result<Word, OutOfBounds> {
        self.check(address)?;
        Ok(self.data[address as usize])
    }

    /// Writes a word to the memory
    pub fn write(&mut self, address: Word, value: Word) -> Result<(), OutOfBounds> {
        self.check(address)?;
        self.data[address as usize] = value;
        Ok(())
    }

    /// Validates an address against the capacity without touching the data
    pub fn check(&self, address: Word) -> Result<(), OutOfBounds> {
        if (address as usize) < S {
            Ok(())
        } else {
            Err(OutOfBounds {
                capacity: S,
                address,
            })
        }
    }
}
