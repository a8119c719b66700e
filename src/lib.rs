//! Emulator for the Hack computer: a 16-bit Harvard-architecture machine
//! with separate instruction and data memories, a memory-mapped 512x256
//! bitmap screen and a single keyboard register.
//!
//! [`memory`] holds the bus and the program loader, [`processor`] the
//! instruction decoder, ALU function table and register state machine,
//! and [`machine`] the fetch-execute loop that ties them together.
//!
//! ```no_run
//! use hack_emulator::machine::Machine;
//! use hack_emulator::memory::Rom;
//!
//! # fn main() -> color_eyre::eyre::Result<()> {
//! let rom = Rom::from_file("program.hack")?;
//! let mut machine = Machine::new(rom);
//! machine.run()?;
//! # Ok(())
//! # }
//! ```

pub mod machine;
pub mod memory;
pub mod processor;
