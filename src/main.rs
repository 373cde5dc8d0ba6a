//! DDP-24 Emulator - CLI Entry Point
//!
//! Commands:
//! - `ddp24 run <image>` - Run a binary image until it halts
//! - `ddp24 debug <image>` - Interactive stepper
//! - `ddp24 test` - Run the built-in instruction self-test

use clap::{Parser, Subcommand};
use ddp24::{Cpu, Word, load_image, save_image};
use ddp24::cpu::MEMORY_SIZE;

#[derive(Parser)]
#[command(name = "ddp24")]
#[command(version = "0.1.0")]
#[command(about = "An emulator of the DDP-24, the guidance computer flown on the Viking Mars landers")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an image until the machine halts
    Run {
        /// Path to the binary image to execute
        image: String,
        /// Cycle budget (0 = run until halt)
        #[arg(short, long, default_value = "0")]
        budget: u64,
        /// Print each instruction as it executes
        #[arg(short, long)]
        trace: bool,
        /// Dump machine state after execution
        #[arg(short, long)]
        dump: bool,
    },
    /// Step through an image interactively
    Debug {
        /// Path to the binary image to debug
        image: String,
    },
    /// Run the built-in self-test
    Test,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Run { image, budget, trace, dump }) => {
            run_program(&image, budget, trace, dump);
        }
        Some(Commands::Debug { image }) => {
            debug_program(&image);
        }
        Some(Commands::Test) => {
            run_self_test();
        }
        None => {
            println!("DDP-24 Emulator v0.1.0");
            println!("Viking Mars lander guidance computer");
            println!();
            println!("Use --help for available commands");
        }
    }
}

fn load_into(path: &str) -> Cpu {
    let mut cpu = Cpu::new();
    let count = match load_image(path, &mut cpu.mem) {
        Ok(count) => count,
        Err(e) => {
            eprintln!("❌ Failed to load image: {}", e);
            std::process::exit(1);
        }
    };

    if count == 0 {
        eprintln!("❌ Empty image: nothing to execute");
        std::process::exit(1);
    }

    println!("📂 Loaded {} words from {}", count, path);
    cpu
}

fn run_program(path: &str, budget: u64, trace: bool, dump: bool) {
    use ddp24::cpu::decode;

    println!("🔧 Running: {}", path);
    let mut cpu = load_into(path);

    println!();
    println!("━━━ Execution ━━━");

    let total = if trace {
        let mut total = 0u64;
        while !cpu.is_halted() && (budget == 0 || total < budget) {
            let pc = cpu.regs.pc;
            let word = cpu.mem.read(pc);
            let instr = decode::decode(word);
            total += cpu.step();
            match decode::Opcode::from_code(instr.opcode) {
                Some(op) => println!(
                    "{:05o}: {:08o}  {:?} {:05o}  A={:08o} B={:08o}",
                    pc, word.raw(), op, instr.address, cpu.regs.a.raw(), cpu.regs.b.raw()
                ),
                None => println!("{:05o}: {:08o}  ???", pc, word.raw()),
            }
        }
        total
    } else {
        cpu.run(budget)
    };

    println!();
    println!("━━━ Result ━━━");
    println!("Cost this run: {}", total);
    println!("Halted: {}", cpu.is_halted());
    if dump || cpu.is_halted() {
        dump_state(&cpu);
    }

    if budget != 0 && total >= budget {
        println!();
        println!("⚠️  Cycle budget exhausted ({}). Use --budget to raise it.", budget);
    }
}

fn debug_program(path: &str) {
    use std::io::{BufRead, Write};

    println!("🔍 Debugging: {}", path);
    let mut cpu = load_into(path);

    println!("Commands: s(tep), r(un), d(ump), m <octal addr>, w <file>, q(uit)");

    let stdin = std::io::stdin();
    loop {
        print!("ddp24> ");
        std::io::stdout().flush().ok();

        let mut line = String::new();
        if stdin.lock().read_line(&mut line).unwrap_or(0) == 0 {
            break;
        }
        let line = line.trim();

        match line.chars().next() {
            Some('s') => {
                let cost = cpu.step();
                println!(
                    "PC={:05o} A={:08o} B={:08o} (+{} cycles)",
                    cpu.regs.pc, cpu.regs.a.raw(), cpu.regs.b.raw(), cost
                );
            }
            Some('r') => {
                cpu.run(0);
                println!("Halted after {} cycles", cpu.cycles);
            }
            Some('d') => dump_state(&cpu),
            Some('m') => {
                let arg = line[1..].trim();
                match u16::from_str_radix(arg, 8) {
                    Ok(addr) => {
                        for (cell, word) in cpu.mem.dump(addr, 8) {
                            println!("[{:05o}] = {:08o}", cell, word.raw());
                        }
                    }
                    Err(_) => println!("Usage: m <octal_addr>"),
                }
            }
            Some('w') => {
                let arg = line[1..].trim();
                if arg.is_empty() {
                    println!("Usage: w <file>");
                } else {
                    let words: Vec<Word> = cpu
                        .mem
                        .dump(0, MEMORY_SIZE)
                        .into_iter()
                        .map(|(_, word)| word)
                        .collect();
                    match save_image(arg, &words) {
                        Ok(()) => println!("Saved {} words to {}", words.len(), arg),
                        Err(e) => println!("Save failed: {}", e),
                    }
                }
            }
            Some('q') => return,
            None => {}
            _ => println!("Unknown command. Use s, r, d, m <addr>, w <file>, or q"),
        }

        if cpu.is_halted() {
            println!("CPU halted.");
        }
    }
}

fn dump_state(cpu: &Cpu) {
    println!("=== DDP-24 CPU State ===");
    println!(
        "PC: {:05o}  A: {:08o}  B: {:08o}",
        cpu.regs.pc, cpu.regs.a.raw(), cpu.regs.b.raw()
    );
    println!(
        "X1: {:05o}  X2: {:05o}  X3: {:05o}",
        cpu.regs.index(1), cpu.regs.index(2), cpu.regs.index(3)
    );
    println!(
        "Flags: {}{}{}",
        if cpu.overflow { "OVF " } else { "" },
        if cpu.halted { "HLT " } else { "" },
        if cpu.interrupt_enabled { "INT " } else { "" }
    );
    println!("Cycles: {}", cpu.cycles);
}

fn run_self_test() {
    use ddp24::cpu::decode::encode;
    use ddp24::Opcode;

    println!("━━━ DDP-24 Emulator Self-Test ━━━");
    println!();

    let mut passed = 0;
    let mut failed = 0;
    let mut check = |name: &str, ok: bool| {
        if ok {
            println!("{}... ✓", name);
            passed += 1;
        } else {
            println!("{}... ✗", name);
            failed += 1;
        }
    };

    // Test 1: word conversion roundtrip
    let mut ok = true;
    for value in [Word::MIN, -100, -1, 0, 1, 100, Word::MAX] {
        if Word::from_i32(value).to_i32() != value {
            ok = false;
            break;
        }
    }
    check("Word conversion roundtrip", ok);

    // Test 2: LDA/STA
    let mut cpu = Cpu::new();
    cpu.mem.load_words(&[
        encode(Opcode::Lda, false, 0, 0o400),
        encode(Opcode::Sta, false, 0, 0o401),
        encode(Opcode::Hlt, false, 0, 0),
    ]);
    cpu.mem.write(0o400, Word::from_raw(0o04531126));
    cpu.run(0);
    check("LDA/STA", cpu.mem.read(0o401).raw() == 0o04531126);

    // Test 3: ADD
    let mut cpu = Cpu::new();
    cpu.mem.load_words(&[
        encode(Opcode::Lda, false, 0, 0o400),
        encode(Opcode::Add, false, 0, 0o401),
        encode(Opcode::Sta, false, 0, 0o402),
        encode(Opcode::Hlt, false, 0, 0),
    ]);
    cpu.mem.write(0o400, Word::from_i32(5));
    cpu.mem.write(0o401, Word::from_i32(3));
    cpu.run(0);
    check("ADD", cpu.mem.read(0o402).to_i32() == 8 && !cpu.overflow);

    // Test 4: JZE
    let mut cpu = Cpu::new();
    cpu.mem.load_words(&[
        encode(Opcode::Lda, false, 0, 0o400),
        encode(Opcode::Jze, false, 0, 0o010),
        encode(Opcode::Lda, false, 0, 0o401),
        encode(Opcode::Hlt, false, 0, 0),
    ]);
    cpu.mem.write(0o010, encode(Opcode::Lda, false, 0, 0o402));
    cpu.mem.write(0o011, encode(Opcode::Hlt, false, 0, 0));
    cpu.mem.write(0o400, Word::zero());
    cpu.mem.write(0o401, Word::from_raw(0xBAD));
    cpu.mem.write(0o402, Word::from_raw(0x600D));
    cpu.run(0);
    check("JZE", cpu.regs.a.raw() == 0x600D);

    // Test 5: signed MPY
    let mut cpu = Cpu::new();
    cpu.mem.load_words(&[
        encode(Opcode::Ldb, false, 0, 0o400),
        encode(Opcode::Mpy, false, 0, 0o401),
        encode(Opcode::Hlt, false, 0, 0),
    ]);
    cpu.mem.write(0o400, Word::from_i32(-5));
    cpu.mem.write(0o401, Word::from_i32(3));
    cpu.run(0);
    check(
        "MPY (signed)",
        cpu.regs.b.raw() == (Word::SIGN_BIT | 15) && cpu.regs.a.raw() == Word::SIGN_BIT,
    );

    // Test 6: DIV
    let mut cpu = Cpu::new();
    cpu.regs.a = Word::zero();
    cpu.regs.b = Word::from_i32(5000);
    cpu.mem.load_words(&[
        encode(Opcode::Div, false, 0, 0o400),
        encode(Opcode::Hlt, false, 0, 0),
    ]);
    cpu.mem.write(0o400, Word::from_i32(50));
    cpu.run(0);
    check(
        "DIV",
        cpu.regs.b.to_i32() == 100 && cpu.regs.a.to_i32() == 0 && !cpu.overflow,
    );

    // Test 7: improper divide
    let mut cpu = Cpu::new();
    cpu.regs.a = Word::from_i32(100);
    cpu.regs.b = Word::zero();
    cpu.mem.load_words(&[
        encode(Opcode::Div, false, 0, 0o400),
        encode(Opcode::Hlt, false, 0, 0),
    ]);
    cpu.mem.write(0o400, Word::from_i32(50));
    cpu.run(0);
    check(
        "DIV (improper)",
        cpu.regs.a.to_i32() == 100 && cpu.regs.b.to_i32() == 0 && cpu.overflow,
    );

    println!();
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Results: {} passed, {} failed", passed, failed);

    if failed == 0 {
        println!("✓ All tests passed!");
    } else {
        std::process::exit(1);
    }
}
