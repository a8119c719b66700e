use std::convert::TryFrom;

use crate::memory::Word;
use color_eyre::eyre::{Result, WrapErr};
use log::*;
use num_enum::IntoPrimitive;
use num_enum::TryFromPrimitive;

/// Emulates the CPU: the A, D and program-counter registers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Processor {
    /// Address/data register
    pub a: Word,
    /// Data register
    pub d: Word,
    /// Program counter
    pub pc: Word,
}

/// Signals driven by one CPU cycle, consumed by the execution loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CpuOutput {
    /// Candidate value for the memory write
    pub out_m: Word,
    /// Whether `out_m` should actually be written to `address_m`
    pub write_m: bool,
    /// Address to read (and possibly write) next
    pub address_m: Word,
    /// Address of the next instruction
    pub pc: Word,
}

impl Processor {
    /// Initializes a new CPU with all registers at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Executes a single decoded instruction (one cycle)
    pub fn execute_instruction(
        &mut self,
        instruction: Instruction,
        in_m: Word,
        reset: bool,
    ) -> CpuOutput {
        let (out_m, write_m) = match instruction {
            Instruction::Address(literal) => {
                self.a = literal;

                debug!("A = {}", literal);
                (0, false)
            }
            Instruction::Compute {
                comp,
                operand,
                dest,
                jump,
            } => {
                let y = match operand {
                    OperandSource::A => self.a,
                    OperandSource::Memory => in_m,
                };
                let result = comp.eval(self.d, y);

                if dest.a {
                    self.a = result;
                }
                if dest.d {
                    self.d = result;
                }
                if jump.taken(result) {
                    // One short of the target; the unconditional increment
                    // below lands the program counter on A exactly.
                    self.pc = self.a.wrapping_sub(1);
                }

                debug!("{} {} = {}", comp, operand, result as i16);
                (result, dest.m)
            }
        };

        self.pc = self.pc.wrapping_add(1);
        if reset {
            // Reset beats both the increment and any jump taken above.
            // A and D keep their values.
            self.pc = 0;
        }

        CpuOutput {
            out_m,
            write_m,
            address_m: self.a,
            pc: self.pc,
        }
    }

    /// Runs one fetch-execute cycle on an instruction word
    pub fn cycle(&mut self, word: Word, in_m: Word, reset: bool) -> Result<CpuOutput> {
        let instruction = Instruction::decode(word)
            .wrap_err_with(|| format!("Invalid instruction: {:#018b}", word))?;
        Ok(self.execute_instruction(instruction, in_m, reset))
    }
}

/// A decoded 16-bit instruction word.
///
/// Bit 15 selects the form: 0 loads a literal into A, 1 computes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    /// A-instruction: load the low 15 bits into the A register
    Address(Word),
    /// C-instruction: ALU operation, destination set, jump condition
    Compute {
        comp: Comp,
        operand: OperandSource,
        dest: Dest,
        jump: Jump,
    },
}

impl Instruction {
    /// Decodes an instruction word into its fields.
    ///
    /// # Errors
    ///
    /// Fails on a C-instruction whose function code is not in the
    /// [`Comp`] table.
    pub fn decode(word: Word) -> Result<Self> {
        if word >> 15 & 1 == 0 {
            return Ok(Instruction::Address(word & 0x7FFF));
        }

        let code = (word >> 6 & 0b11_1111) as u8;
        let comp = Comp::try_from(code)
            .wrap_err_with(|| format!("undefined ALU function code: 0b{:06b}", code))?;

        Ok(Instruction::Compute {
            comp,
            operand: if word >> 12 & 1 == 1 {
                OperandSource::Memory
            } else {
                OperandSource::A
            },
            dest: Dest::decode(word >> 3),
            jump: Jump::decode(word),
        })
    }
}

/// Which value feeds the ALU as second operand (bit 12 of a C-instruction)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandSource {
    /// The A register
    A,
    /// The memory word addressed by A, as fetched this cycle
    Memory,
}

impl std::fmt::Display for OperandSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OperandSource::A => f.write_str("A"),
            OperandSource::Memory => f.write_str("M"),
        }
    }
}

/// Destination set of a C-instruction (bits 5-3): any subset of A, D and
/// memory may receive the computed result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Dest {
    pub a: bool,
    pub d: bool,
    pub m: bool,
}

impl Dest {
    fn decode(bits: Word) -> Self {
        Self {
            a: bits & 0b100 != 0,
            d: bits & 0b010 != 0,
            m: bits & 0b001 != 0,
        }
    }
}

/// Jump condition of a C-instruction (bits 2-0), evaluated against the
/// signed computed result. All three flags set is an unconditional jump,
/// none set never jumps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Jump {
    pub lt: bool,
    pub eq: bool,
    pub gt: bool,
}

impl Jump {
    fn decode(bits: Word) -> Self {
        Self {
            lt: bits & 0b100 != 0,
            eq: bits & 0b010 != 0,
            gt: bits & 0b001 != 0,
        }
    }

    /// Whether the condition holds for `result`
    pub fn taken(&self, result: Word) -> bool {
        let result = result as i16;
        self.lt && result < 0 || self.eq && result == 0 || self.gt && result > 0
    }
}

macro_rules! alu_functions {
    ( $( $( #[doc = $doc:expr] )+ $name:ident = $code:literal , )+ ) => {
        /// The ALU function table: every defined 6-bit function code.
        ///
        /// Bits 11-6 of a C-instruction select one of these; bit 12 picks
        /// the second operand `y` (A register or fetched memory word), the
        /// D register is always the first operand. Any other code is
        /// undefined and rejected at decode time.
        #[repr(u8)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
        #[derive(TryFromPrimitive, IntoPrimitive)]
        pub enum Comp {
            $(
                $( #[doc = $doc] )+
                $name = $code,
            )+
        }

        impl Comp {
            pub const ALL: &'static [Self] = &[
                $( Self::$name , )+
            ];

            pub fn name(&self) -> &'static str {
                match self {
                    $( Self::$name => stringify!($name) , )+
                }
            }
        }

        impl ::std::fmt::Display for Comp {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                match self {
                    $( Self::$name => f.write_str(stringify!($name)) , )+
                }
            }
        }
    }
}

alu_functions! {
    /// Constant 0
    Zero = 0b101010,
    /// Constant 1
    One = 0b111111,
    /// Constant -1
    NegOne = 0b111010,
    /// Pass through D
    D = 0b001100,
    /// Pass through the second operand
    Y = 0b110000,
    /// Bitwise NOT of D
    NotD = 0b001101,
    /// Bitwise NOT of the second operand
    NotY = 0b110001,
    /// Arithmetic negation of D
    NegD = 0b001111,
    /// Arithmetic negation of the second operand
    NegY = 0b110011,
    /// D plus one
    DPlusOne = 0b011111,
    /// Second operand plus one
    YPlusOne = 0b110111,
    /// D minus one
    DMinusOne = 0b001110,
    /// Second operand minus one
    YMinusOne = 0b110010,
    /// D plus the second operand
    DPlusY = 0b000010,
    /// D minus the second operand
    DMinusY = 0b010011,
    /// Second operand minus D
    YMinusD = 0b000111,
    /// Bitwise AND of D and the second operand
    DAndY = 0b000000,
    /// Bitwise OR of D and the second operand
    DOrY = 0b010101,
}

impl Comp {
    /// Computes the function over two's-complement words; overflow wraps
    pub fn eval(self, d: Word, y: Word) -> Word {
        match self {
            Comp::Zero => 0,
            Comp::One => 1,
            Comp::NegOne => 0xFFFF,
            Comp::D => d,
            Comp::Y => y,
            Comp::NotD => !d,
            Comp::NotY => !y,
            Comp::NegD => d.wrapping_neg(),
            Comp::NegY => y.wrapping_neg(),
            Comp::DPlusOne => d.wrapping_add(1),
            Comp::YPlusOne => y.wrapping_add(1),
            Comp::DMinusOne => d.wrapping_sub(1),
            Comp::YMinusOne => y.wrapping_sub(1),
            Comp::DPlusY => d.wrapping_add(y),
            Comp::DMinusY => d.wrapping_sub(y),
            Comp::YMinusD => y.wrapping_sub(d),
            Comp::DAndY => d & y,
            Comp::DOrY => d | y,
        }
    }
}
