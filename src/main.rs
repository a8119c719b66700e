use std::env;

use color_eyre::eyre::{eyre, Result};
use log::*;
use simple_logger::SimpleLogger;

use hack_emulator::machine::Machine;
use hack_emulator::memory::Rom;

fn main() -> Result<()> {
    color_eyre::install()?; // rust error handling
    SimpleLogger::new().with_level(LevelFilter::Info).init()?; // logging

    let mut args = env::args().skip(1);
    let path = match (args.next(), args.next()) {
        (Some(path), None) => path,
        _ => return Err(eyre!("usage: hack-emulator <program.hack>")),
    };

    let rom = Rom::from_file(&path)?;
    info!("loaded `{}`, starting execution", path);

    let mut machine = Machine::new(rom);
    // Runs until an out-of-bounds program counter or address halts the
    // loop; the fault names the capacity and the offending location.
    machine.run()
}
