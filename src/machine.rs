use crate::memory::{Ram, Rom, Word, KEYBOARD, SCREEN_END, SCREEN_START};
use crate::processor::{CpuOutput, Processor};
use color_eyre::eyre::Result;

/// The assembled computer: CPU, data memory, instruction memory and the
/// signals left over from the previous cycle.
///
/// [`Machine::step`] is the only place that sequences fetch, execute and
/// write-back; the CPU never touches memory itself.
#[derive(Debug, Clone)]
pub struct Machine {
    pub cpu: Processor,
    ram: Ram,
    rom: Rom,
    out: CpuOutput,
}

impl Machine {
    /// Builds a machine around a loaded program. RAM and registers start
    /// at zero.
    pub fn new(rom: Rom) -> Self {
        Self {
            cpu: Processor::new(),
            ram: Ram::default(),
            rom,
            out: CpuOutput::default(),
        }
    }

    /// Runs one fetch-execute cycle.
    ///
    /// Fetches the instruction at the program counter and the data word at
    /// the current address, applies the previous cycle's pending write,
    /// then cycles the CPU. An out-of-bounds program counter or address is
    /// fatal and leaves the pending write unapplied.
    pub fn step(&mut self, reset: bool) -> Result<()> {
        let instruction = self.rom.read(self.out.pc)?;
        self.ram.check(self.out.address_m)?;

        if self.out.write_m {
            self.ram.write(self.out.address_m, self.out.out_m)?;
        }
        // Fetched after the write-back so the CPU sees the value it just
        // stored at this address.
        let in_m = self.ram.read(self.out.address_m)?;

        self.out = self.cpu.cycle(instruction, in_m, reset)?;
        Ok(())
    }

    /// Runs cycles until a fault halts the loop.
    ///
    /// The machine has no halt instruction; programs idle in a tight jump
    /// loop when done, so this only returns on an error.
    pub fn run(&mut self) -> Result<()> {
        loop {
            self.step(false)?;
        }
    }

    /// The screen bitmap: 256 rows of 32 words, one bit per pixel.
    ///
    /// Read by the display collaborator between cycles; the CPU itself
    /// attaches no meaning to this region.
    pub fn screen(&self) -> &[Word] {
        &self.ram.data[SCREEN_START as usize..=SCREEN_END as usize]
    }

    /// Sets the keyboard register to the ASCII code of the pressed key.
    ///
    /// Called by the input collaborator on key-down with the code and on
    /// key-up with 0, between cycles.
    pub fn set_key(&mut self, key: Word) {
        self.ram.data[KEYBOARD as usize] = key;
    }

    /// Reads a data-memory word, for hosts and tests
    pub fn peek(&self, address: Word) -> Result<Word> {
        Ok(self.ram.read(address)?)
    }

    /// Writes a data-memory word, for hosts and tests
    pub fn poke(&mut self, address: Word, value: Word) -> Result<()> {
        Ok(self.ram.write(address, value)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{RAM_SIZE, ROM_SIZE};
    use color_eyre::eyre::Result;

    fn load(lines: &[&str]) -> Rom {
        lines.join("\n").parse().unwrap()
    }

    #[test]
    fn test_store_to_memory() -> Result<()> {
        // @7 / D=A / @3 / M=D
        let rom = load(&[
            "0000000000000111",
            "1110110000010000",
            "0000000000000011",
            "1110001100001000",
        ]);
        let mut machine = Machine::new(rom);

        for _ in 0..4 {
            machine.step(false)?;
        }
        // The write signal raised by `M=D` is applied on the next fetch.
        machine.step(false)?;

        assert_eq!(machine.peek(3)?, 7);

        Ok(())
    }

    #[test]
    fn test_write_lands_before_fetch() -> Result<()> {
        // @3 / M=1 / D=M: the D register must observe the fresh write.
        let rom = load(&[
            "0000000000000011",
            "1110111111001000",
            "1111110000010000",
        ]);
        let mut machine = Machine::new(rom);

        for _ in 0..3 {
            machine.step(false)?;
        }

        assert_eq!(machine.peek(3)?, 1);
        assert_eq!(machine.cpu.d, 1);

        Ok(())
    }

    #[test]
    fn test_countdown_loop() -> Result<()> {
        // @5 / D=A / loop: D=D-1 / @2 / D;JGT -- runs until D hits zero.
        let rom = load(&[
            "0000000000000101",
            "1110110000010000",
            "1110001110010000",
            "0000000000000010",
            "1110001100000001",
        ]);
        let mut machine = Machine::new(rom);

        // 2 setup cycles plus 3 per loop iteration, 5 iterations, then
        // the final falling-through comparison.
        for _ in 0..2 + 3 * 5 {
            machine.step(false)?;
        }

        assert_eq!(machine.cpu.d, 0);
        assert_eq!(machine.cpu.pc, 5);

        Ok(())
    }

    #[test]
    fn test_reset_restarts_program() -> Result<()> {
        let rom = load(&["0000000000001111", "1110110000010000"]);
        let mut machine = Machine::new(rom);

        machine.step(false)?;
        machine.step(true)?;
        assert_eq!(machine.cpu.pc, 0);

        // The next cycle re-executes the first instruction.
        machine.step(false)?;
        assert_eq!(machine.cpu.a, 15);

        Ok(())
    }

    #[test]
    fn test_program_counter_out_of_bounds_is_fatal() -> Result<()> {
        let mut machine = Machine::new(Rom::default());
        machine.cpu.pc = ROM_SIZE as Word;
        machine.out.pc = ROM_SIZE as Word;

        assert!(machine.step(false).is_err());

        Ok(())
    }

    #[test]
    fn test_fault_skips_pending_write() -> Result<()> {
        let mut machine = Machine::new(Rom::default());
        machine.out = CpuOutput {
            out_m: 42,
            write_m: true,
            address_m: 3,
            pc: ROM_SIZE as Word,
        };

        assert!(machine.step(false).is_err());
        // The bad program counter halts the cycle before the write-back.
        assert_eq!(machine.peek(3)?, 0);

        Ok(())
    }

    #[test]
    fn test_address_out_of_bounds_is_fatal() -> Result<()> {
        // @24577 points one past the keyboard register; the next fetch
        // through it must fault.
        let rom = load(&["0110000000000001"]);
        let mut machine = Machine::new(rom);

        machine.step(false)?;
        assert!(machine.step(false).is_err());

        Ok(())
    }

    #[test]
    fn test_keyboard_register_is_readable_by_program() -> Result<()> {
        // @24576 / D=M
        let rom = load(&["0110000000000000", "1111110000010000"]);
        let mut machine = Machine::new(rom);
        machine.set_key(b'K' as Word);

        machine.step(false)?;
        machine.step(false)?;

        assert_eq!(machine.cpu.d, b'K' as Word);

        machine.set_key(0);
        assert_eq!(machine.peek(KEYBOARD)?, 0);

        Ok(())
    }

    #[test]
    fn test_screen_slice_tracks_program_writes() -> Result<()> {
        // @16384 / M=-1: blacken the first 16 pixels.
        let rom = load(&["0100000000000000", "1110111010001000"]);
        let mut machine = Machine::new(rom);

        for _ in 0..3 {
            machine.step(false)?;
        }

        assert_eq!(machine.screen().len(), RAM_SIZE - 1 - SCREEN_START as usize);
        assert_eq!(machine.screen()[0], 0xFFFF);
        assert_eq!(machine.screen()[1], 0);

        Ok(())
    }
}
