use clap::Parser;
use clap_num::maybe_hex;

use riscvemu::core::Core;
use riscvemu::elf_utils::load_elf;
use riscvemu::exec::Rv32iUnit;
use riscvemu::memory::console::ConsoleDevice;
use riscvemu::memory::{Memory, MmioRegion, Region};
use riscvemu::registers::{Endianness, IntRegFile};

/// The whole 32-bit physical address space; regions are allocated
/// sparsely on write so this costs nothing until a program touches it.
const MEMORY_SIZE: u64 = 0x1_0000_0000;
const DEFAULT_REGION_SIZE: u64 = 0x1000;
const CONSOLE_ADDRESS: u64 = 0x1000_0000;

/// Emulate a 32-bit RISC-V (RV32I) processor
#[derive(Parser, Debug)]
#[command(author, version, about, long_about)]
struct Args {
    /// Path to an ELF executable to load and run
    input: String,

    /// Single step through each instruction and print state
    #[arg(short, long)]
    debug: bool,

    /// Break on program counter match and begin debug stepping (use
    /// 0x prefix for hexadecimal)
    #[arg(short, long, value_parser=maybe_hex::<u32>)]
    pc_breakpoint: Option<u32>,

    /// Break on cycle count match and begin debug stepping (use 0x
    /// prefix for hexadecimal)
    #[arg(short, long, value_parser=maybe_hex::<u64>)]
    cycle_breakpoint: Option<u64>,

    /// Print the 8-word memory region starting from this address after
    /// each debug step (use 0x prefix for hexadecimal)
    #[arg(short, long, value_parser=maybe_hex::<u32>)]
    memory: Option<u32>,
}

fn press_enter_to_continue() {
    use std::io::{self, Read, Write};
    let mut stdout = io::stdout();
    write!(stdout, "Press enter to continue...").unwrap();
    stdout.flush().unwrap();
    let _ = io::stdin().read(&mut [0u8]).unwrap();
}

fn print_memory(core: &mut Core, base: u32) {
    for n in 0..8u32 {
        let addr = (base + 4 * n) as u64;
        match core.memory.read_word(addr) {
            Ok(word) => println!("{addr:x}: {word:08x}"),
            Err(e) => println!("{addr:x}: <{e}>"),
        }
    }
}

fn main() {
    let args = Args::parse();

    let mut memory = Memory::new(0, MEMORY_SIZE, DEFAULT_REGION_SIZE).expect("valid memory layout");
    memory
        .add_region(Region::Mmio(MmioRegion::new(
            CONSOLE_ADDRESS,
            4,
            Box::new(ConsoleDevice::with_echo()),
        )))
        .expect("console region does not overlap ELF-loaded sections");

    let entry = match load_elf(&mut memory, &args.input) {
        Ok(entry) => entry,
        Err(e) => {
            eprintln!("Error loading ELF: {e}");
            std::process::exit(1);
        }
    };

    let mut registers = IntRegFile::new(4, 33, Endianness::Little, 32).expect("valid register layout");
    registers.set_pc(entry);

    let mut core = Core::new(memory, registers);
    core.register_unit(Box::new(Rv32iUnit::new()));

    let breakpoints_set = args.pc_breakpoint.is_some() || args.cycle_breakpoint.is_some();
    core.trace = args.debug;

    loop {
        if !core.trace && breakpoints_set {
            if args.pc_breakpoint == Some(core.registers.get_pc() as u32)
                || args.cycle_breakpoint == Some(core.cycle())
            {
                core.trace = true;
            }
        }

        if let Err(e) = core.step() {
            println!(
                "Stopped at pc=0x{:x}, cycle={}: {e}",
                core.registers.get_pc(),
                core.cycle()
            );
            return;
        }

        if core.trace {
            if let Some(base) = args.memory {
                println!("Memory:");
                print_memory(&mut core, base);
            }
            if args.debug {
                press_enter_to_continue();
            }
        }
    }
}
